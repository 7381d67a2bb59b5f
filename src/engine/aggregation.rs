// ==========================================
// PSI 供需平衡引擎 - 供给侧汇总 (子 P -> 父 S)
// ==========================================
// 职责: 将所有子节点 P 按子节点提前期平移后并入父节点 S
// 输入: 子节点 P 桶 (已完成本层推导)
// 输出: 父节点 S 桶
// 红线: REPLACE 模式先清空父 S,重复调用结果一致
// 红线: 同一 (周, 桶) 重复批次为空操作,只计数
// 反向: distribute 将父节点 P 下发到各子节点 S (先序驱动的调达侧推演)
// ==========================================

use crate::domain::node::NodeId;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{AggregationPolicy, Bucket, Layer, ShiftDirection};
use crate::engine::report::Anomaly;
use crate::engine::shifter::{LotMove, LotShifter};
use tracing::{debug, instrument};

/// 汇总结果
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub inserted: usize,
    pub duplicates: usize,
    pub anomalies: Vec<Anomaly>,
}

// ==========================================
// SupplyAggregator - 供给侧汇总器
// ==========================================
pub struct SupplyAggregator {
    shifter: LotShifter,
}

impl SupplyAggregator {
    pub fn new() -> Self {
        Self {
            shifter: LotShifter::new(),
        }
    }

    /// 汇总单个父节点
    ///
    /// # 参数
    /// - `tree`: 供应链树
    /// - `parent`: 父节点
    /// - `layer`: 读写的层
    /// - `policy`: REPLACE / ACCUMULATE
    /// - `direction`: 平移方向 (默认 FORWARD)
    ///
    /// # 说明
    /// 叶子节点没有子节点: REPLACE 时直接返回,保留其种子 S
    #[instrument(skip(self, tree), fields(parent = %tree.node(parent).name, layer = %layer, policy = %policy))]
    pub fn aggregate(
        &self,
        tree: &mut SupplyTree,
        parent: NodeId,
        layer: Layer,
        policy: AggregationPolicy,
        direction: ShiftDirection,
    ) -> AggregationResult {
        if tree.node(parent).is_leaf() {
            return AggregationResult::default();
        }

        let horizon = tree.horizon();
        let children = tree.node(parent).children.clone();

        // 先算全部子节点的移动,再一次性写入父节点
        let mut moves: Vec<LotMove> = Vec::new();
        for child_id in &children {
            let child = tree.node(*child_id);
            moves.extend(self.shifter.plan_moves(
                child,
                child.psi(layer).bucket_weeks(Bucket::Arrival),
                child.lead_time_weeks,
                direction,
                horizon,
            ));
        }

        let parent_node = tree.node_mut(parent);
        let name = parent_node.name.clone();
        let buffer = parent_node.psi_mut(layer);
        if policy == AggregationPolicy::Replace {
            buffer.clear_bucket(Bucket::Ship);
        }
        let (inserted, anomalies) =
            self.shifter
                .apply_moves(buffer, Bucket::Ship, moves, &name, layer);
        let duplicates = anomalies
            .iter()
            .filter(|a| matches!(a, Anomaly::DuplicateLot { .. }))
            .count();

        debug!(
            parent = %name,
            children = children.len(),
            inserted = inserted,
            duplicates = duplicates,
            "子节点 P 汇总到父节点 S"
        );

        AggregationResult {
            inserted,
            duplicates,
            anomalies,
        }
    }

    /// 下发父节点 P 到各子节点 S
    ///
    /// 每个子节点按自身提前期与休假周平移;REPLACE 模式先清空子节点 S
    ///
    /// # 参数
    /// - `direction`: 平移方向 (调达侧为 BACKWARD: 子节点须提前出荷)
    #[instrument(skip(self, tree), fields(parent = %tree.node(parent).name, layer = %layer, policy = %policy))]
    pub fn distribute(
        &self,
        tree: &mut SupplyTree,
        parent: NodeId,
        layer: Layer,
        policy: AggregationPolicy,
        direction: ShiftDirection,
    ) -> AggregationResult {
        let horizon = tree.horizon();
        let children = tree.node(parent).children.clone();

        let mut planned: Vec<(NodeId, Vec<LotMove>)> = Vec::with_capacity(children.len());
        {
            let arrivals = tree.node(parent).psi(layer);
            for child_id in &children {
                let child = tree.node(*child_id);
                let moves = self.shifter.plan_moves(
                    child,
                    arrivals.bucket_weeks(Bucket::Arrival),
                    child.lead_time_weeks,
                    direction,
                    horizon,
                );
                planned.push((*child_id, moves));
            }
        }

        let mut result = AggregationResult::default();
        for (child_id, moves) in planned {
            let child = tree.node_mut(child_id);
            let name = child.name.clone();
            let buffer = child.psi_mut(layer);
            if policy == AggregationPolicy::Replace {
                buffer.clear_bucket(Bucket::Ship);
            }
            let (inserted, anomalies) = self.shifter.apply_moves(buffer, Bucket::Ship, moves, &name, layer);
            result.inserted += inserted;
            result.duplicates += anomalies
                .iter()
                .filter(|a| matches!(a, Anomaly::DuplicateLot { .. }))
                .count();
            result.anomalies.extend(anomalies);
        }

        debug!(
            parent = %tree.node(parent).name,
            children = children.len(),
            inserted = result.inserted,
            "父节点 P 下发到子节点 S"
        );
        result
    }
}

impl Default for SupplyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

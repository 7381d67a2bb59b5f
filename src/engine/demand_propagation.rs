// ==========================================
// PSI 供需平衡引擎 - 需求侧传播 (S -> P)
// ==========================================
// 职责: 单节点由自身 S 推导自身 P,再平衡出 I
// 输入: 节点 S 桶 (可来自另一层) + 安全库存周 + 提前期
// 输出: 节点 CO(清空) / I / P
// 红线: 派生桶每次先清空再重算 (幂等)
// ==========================================

use crate::domain::node::PlanNode;
use crate::domain::types::{Bucket, Layer, ShiftDirection};
use crate::engine::balance::BalanceEngine;
use crate::engine::report::Anomaly;
use crate::engine::shifter::LotShifter;
use tracing::{debug, instrument};

/// 单节点传播结果
#[derive(Debug, Clone, Default)]
pub struct PropagationResult {
    pub moved: usize,
    pub anomalies: Vec<Anomaly>,
}

// ==========================================
// DemandPropagator - 需求侧传播器
// ==========================================
pub struct DemandPropagator {
    shifter: LotShifter,
    balance: BalanceEngine,
}

impl DemandPropagator {
    pub fn new() -> Self {
        Self {
            shifter: LotShifter::new(),
            balance: BalanceEngine::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// S -> P -> I (同一层)
    #[instrument(skip(self, node), fields(node = %node.name, layer = %layer))]
    pub fn propagate(
        &self,
        node: &mut PlanNode,
        layer: Layer,
        direction: ShiftDirection,
    ) -> PropagationResult {
        let mut result = self.derive_arrivals(node, layer, layer, direction);
        result.anomalies.extend(self.balance.balance(node, layer));
        result
    }

    /// 只推导 P,不做平衡
    ///
    /// 先清空目标层 CO / I / P;源层 S 保持不变
    ///
    /// # 参数
    /// - `source`: 读取 S 的层
    /// - `target`: 写入 P 的层
    ///
    /// # 说明
    /// offset = 安全库存周 + 提前期;offset 为 0 时 P[w] = S[w],不平移
    pub fn derive_arrivals(
        &self,
        node: &mut PlanNode,
        source: Layer,
        target: Layer,
        direction: ShiftDirection,
    ) -> PropagationResult {
        let offset = node.demand_offset();
        let horizon = node.horizon();

        let moves = {
            let ship = node.psi(source).bucket_weeks(Bucket::Ship);
            if offset == 0 {
                self.shifter.identity_moves(ship)
            } else {
                self.shifter.plan_moves(&*node, ship, offset, direction, horizon)
            }
        };

        let name = node.name.clone();
        let buffer = node.psi_mut(target);
        buffer.clear_derived();
        let (moved, anomalies) =
            self.shifter
                .apply_moves(buffer, Bucket::Arrival, moves, &name, target);

        debug!(
            node = %name,
            offset = offset,
            moved = moved,
            anomalies = anomalies.len(),
            "S -> P 推导完成"
        );

        PropagationResult { moved, anomalies }
    }
}

impl Default for DemandPropagator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// PSI 供需平衡引擎 - 树遍历驱动
// ==========================================
// 职责: 后序驱动需求层推演 (子节点 P 先于父节点汇总)
//       先序驱动调达侧推演 (父节点 P 下发为子节点 S)
// 输入: 已播种叶子 S (后序) 或已播种根节点 S (先序) 的树
// 输出: 全树 S / CO / I / P
// 红线: 后序时父节点读取子节点 P 必须发生在子节点推导完成之后
// 红线: 先序时子节点 S 必须在父节点 P 推导完成之后写入
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Layer, ShiftDirection};
use crate::engine::aggregation::SupplyAggregator;
use crate::engine::demand_propagation::DemandPropagator;
use crate::engine::report::Anomaly;
use crate::perf::PerfGuard;
use tracing::{info, instrument};

/// 一次遍历的结果
#[derive(Debug, Clone, Default)]
pub struct PassResult {
    pub nodes_visited: usize,
    pub lots_moved: usize,
    pub anomalies: Vec<Anomaly>,
}

impl PassResult {
    pub fn absorb(&mut self, moved: usize, anomalies: Vec<Anomaly>) {
        self.lots_moved += moved;
        self.anomalies.extend(anomalies);
    }
}

// ==========================================
// TreeWalker - 树遍历驱动
// ==========================================
pub struct TreeWalker {
    aggregator: SupplyAggregator,
    propagator: DemandPropagator,
}

impl TreeWalker {
    pub fn new() -> Self {
        Self {
            aggregator: SupplyAggregator::new(),
            propagator: DemandPropagator::new(),
        }
    }

    /// 需求层推演 (预测账本)
    ///
    /// 后序遍历,每个节点:
    /// 1) 非叶子: 子节点 P -> 本节点 S (按配置的汇总策略)
    /// 2) S -> P,平衡出 I
    ///
    /// 叶子 S 为种子数据,保持不变
    #[instrument(skip(self, tree, config), fields(product = %tree.product(), nodes = tree.len()))]
    pub fn demand_pass(&self, tree: &mut SupplyTree, config: &PlanningConfig) -> PassResult {
        let _perf = PerfGuard::new("demand_pass");
        self.layer_pass(tree, Layer::Demand, config)
    }

    /// 对任意一层执行 "汇总 + S->P + 平衡" 的后序遍历
    pub fn layer_pass(&self, tree: &mut SupplyTree, layer: Layer, config: &PlanningConfig) -> PassResult {
        let mut result = PassResult::default();
        for id in tree.postorder() {
            if !tree.node(id).is_leaf() {
                let agg = self.aggregator.aggregate(
                    tree,
                    id,
                    layer,
                    config.aggregation_policy,
                    config.aggregation_shift_direction,
                );
                result.absorb(agg.inserted, agg.anomalies);
            }
            let prop = self
                .propagator
                .propagate(tree.node_mut(id), layer, config.demand_shift_direction);
            result.absorb(prop.moved, prop.anomalies);
            result.nodes_visited += 1;
        }

        info!(
            product = %tree.product(),
            layer = %layer,
            nodes = result.nodes_visited,
            lots_moved = result.lots_moved,
            anomalies = result.anomalies.len(),
            "层推演完成"
        );
        result
    }

    /// 先序推演 (调达侧,逆向计划)
    ///
    /// 每个节点:
    /// 1) S -> P 向前追溯 (BACKWARD),平衡出 I
    /// 2) 非叶子: 本节点 P -> 子节点 S,按子节点提前期与休假周向前追溯
    ///
    /// 根节点 S 为种子数据,保持不变
    #[instrument(skip(self, tree, config), fields(product = %tree.product(), nodes = tree.len()))]
    pub fn preorder_pass(&self, tree: &mut SupplyTree, layer: Layer, config: &PlanningConfig) -> PassResult {
        let _perf = PerfGuard::new("preorder_pass");
        let mut result = PassResult::default();
        for id in tree.preorder() {
            let prop = self
                .propagator
                .propagate(tree.node_mut(id), layer, ShiftDirection::Backward);
            result.absorb(prop.moved, prop.anomalies);

            if !tree.node(id).is_leaf() {
                let dist = self.aggregator.distribute(
                    tree,
                    id,
                    layer,
                    config.aggregation_policy,
                    ShiftDirection::Backward,
                );
                result.absorb(dist.inserted, dist.anomalies);
            }
            result.nodes_visited += 1;
        }

        info!(
            product = %tree.product(),
            layer = %layer,
            nodes = result.nodes_visited,
            lots_moved = result.lots_moved,
            anomalies = result.anomalies.len(),
            "先序推演完成"
        );
        result
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

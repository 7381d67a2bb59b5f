// ==========================================
// PSI 供需平衡引擎 - 解耦点 / 推拉规划
// ==========================================
// 职责: 按解耦点集合划分推式/拉式段,推演供给层
// 输入: 已完成需求层推演的树 + 解耦点集合 + 周产能
// 输出: 供给层全树 S / CO / I / P + 候选方案评估
// 规则 (供给层,后序):
// - 拉式节点: 叶子保留确认 S;非叶子 S = 子节点供给 P 汇总;P 由 S 推导
// - 解耦节点: S 同拉式;P 由预测 S (需求层) 推导,再按模板平准化;I 即缓冲库存
// - 推式节点: S = 预测 S;P 推导后按模板平准化
// 红线: 多方案评估在树的副本上进行,基准树不被修改
// ==========================================

use crate::config::PlanningConfig;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::node::NodeId;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer, NodeSide};
use crate::engine::aggregation::SupplyAggregator;
use crate::engine::balance::BalanceEngine;
use crate::engine::demand_propagation::DemandPropagator;
use crate::engine::leveling::CapacityLeveler;
use crate::engine::report::{Anomaly, AnomalyTotals};
use crate::engine::seeding::TemplateBook;
use crate::engine::walker::PassResult;
use crate::perf::PerfGuard;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// 候选解耦方案评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoupleEvaluation {
    /// 解耦节点名
    pub decouple_nodes: Vec<String>,

    /// 供给层全树库存批次周数 (Σ|I[w]|)
    pub inventory_lot_weeks: usize,

    /// 解耦节点缓冲库存批次周数
    pub buffer_lot_weeks: usize,

    /// 欠供批次数
    pub under_supplied_lots: usize,

    /// 越界批次数
    pub range_overflows: usize,

    /// 产能不足批次数
    pub capacity_shortfalls: usize,
}

// ==========================================
// DecouplePlanner - 解耦点规划器
// ==========================================
pub struct DecouplePlanner {
    aggregator: SupplyAggregator,
    propagator: DemandPropagator,
    leveler: CapacityLeveler,
    balance: BalanceEngine,
}

impl DecouplePlanner {
    pub fn new() -> Self {
        Self {
            aggregator: SupplyAggregator::new(),
            propagator: DemandPropagator::new(),
            leveler: CapacityLeveler::new(),
            balance: BalanceEngine::new(),
        }
    }

    // ==========================================
    // 分区
    // ==========================================

    /// 节点名 -> 节点句柄
    ///
    /// # 返回
    /// - `Err(UnknownDecoupleNode)`: 名称不在树中
    pub fn resolve(&self, tree: &SupplyTree, names: &[String]) -> PlanningResult<Vec<NodeId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = tree.find(name).ok_or_else(|| PlanningError::UnknownDecoupleNode {
                product: tree.product().to_string(),
                node: name.clone(),
            })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// 节点分区 (按 NodeId 下标)
    ///
    /// 解耦点本身为 DECOUPLE;其严格祖先为 PUSH;其余为 PULL。
    /// 空集合时全树为 PULL
    pub fn classify(&self, tree: &SupplyTree, decouple: &[NodeId]) -> Vec<NodeSide> {
        let mut sides = vec![NodeSide::Pull; tree.len()];
        for id in decouple {
            for ancestor in tree.ancestors(*id) {
                sides[ancestor] = NodeSide::Push;
            }
        }
        for id in decouple {
            sides[*id] = NodeSide::Decouple;
        }
        sides
    }

    // ==========================================
    // 供给层推演
    // ==========================================

    /// 按解耦点集合推演供给层
    ///
    /// # 前置条件
    /// 需求层已完成推演 (推式/解耦节点读取需求层 S)
    #[instrument(skip(self, tree, decouple, templates, config), fields(
        product = %tree.product(),
        decouple_count = decouple.len()
    ))]
    pub fn plan(
        &self,
        tree: &mut SupplyTree,
        decouple: &[NodeId],
        templates: &TemplateBook,
        config: &PlanningConfig,
    ) -> PassResult {
        let _perf = PerfGuard::new("supply_pass");
        let sides = self.classify(tree, decouple);
        let mut result = PassResult::default();

        for id in tree.postorder() {
            let side = sides[id];
            match side {
                NodeSide::Pull | NodeSide::Decouple => {
                    if !tree.node(id).is_leaf() {
                        let agg = self.aggregator.aggregate(
                            tree,
                            id,
                            Layer::Supply,
                            config.aggregation_policy,
                            config.aggregation_shift_direction,
                        );
                        result.absorb(agg.inserted, agg.anomalies);
                    }
                }
                NodeSide::Push => {
                    self.copy_forecast_ship(tree, id);
                }
            }

            let node = tree.node_mut(id);
            let source = match side {
                NodeSide::Pull | NodeSide::Push => Layer::Supply,
                NodeSide::Decouple => Layer::Demand,
            };
            let prop = self.propagator.derive_arrivals(
                node,
                source,
                Layer::Supply,
                config.demand_shift_direction,
            );
            result.absorb(prop.moved, prop.anomalies);

            if side.is_above() {
                if let Some(capacity) = templates.get(&id) {
                    let leveled = self.leveler.level(node, Layer::Supply, capacity);
                    result.absorb(0, leveled.anomalies);
                }
            }

            result.absorb(0, self.balance.balance(node, Layer::Supply));
            result.nodes_visited += 1;

            debug!(node = %node.name, side = %side, "供给层节点推演完成");
        }

        info!(
            product = %tree.product(),
            nodes = result.nodes_visited,
            lots_moved = result.lots_moved,
            anomalies = result.anomalies.len(),
            "供给层推演完成"
        );
        result
    }

    /// 推式节点: 供给层 S = 需求层 S
    fn copy_forecast_ship(&self, tree: &mut SupplyTree, id: NodeId) {
        let node = tree.node_mut(id);
        let forecast: Vec<(usize, Vec<_>)> = node
            .psi(Layer::Demand)
            .bucket_weeks(Bucket::Ship)
            .filter(|(_, lots)| !lots.is_empty())
            .map(|(w, lots)| (w, lots.to_vec()))
            .collect();
        let supply = node.psi_mut(Layer::Supply);
        supply.clear_bucket(Bucket::Ship);
        for (week, lots) in forecast {
            for lot in lots {
                supply.insert(week, Bucket::Ship, lot);
            }
        }
    }

    // ==========================================
    // 候选方案
    // ==========================================

    /// 由叶子到根枚举候选解耦点集合
    ///
    /// 高度 h = 0..=height(root): 每个叶子取第一个高度 >= h 的祖先(含自身),去重。
    /// 相同集合只保留一次
    pub fn candidate_sets(&self, tree: &SupplyTree) -> Vec<Vec<NodeId>> {
        let heights: Vec<usize> = (0..tree.len()).map(|id| tree.height(id)).collect();
        let leaves = tree.leaves();
        let root_height = heights[tree.root()];

        let mut sets: Vec<Vec<NodeId>> = Vec::new();
        for h in 0..=root_height {
            let mut set: Vec<NodeId> = Vec::new();
            for leaf in &leaves {
                let mut current = *leaf;
                while heights[current] < h {
                    match tree.node(current).parent {
                        Some(parent) => current = parent,
                        None => break,
                    }
                }
                if !set.contains(&current) {
                    set.push(current);
                }
            }
            if !sets.contains(&set) {
                sets.push(set);
            }
        }
        sets
    }

    /// 在树副本上逐个评估候选方案
    ///
    /// # 参数
    /// - `tree`: 已完成需求层推演的基准树 (只读)
    /// - `candidates`: 候选解耦点集合
    pub fn evaluate(
        &self,
        tree: &SupplyTree,
        candidates: &[Vec<NodeId>],
        templates: &TemplateBook,
        config: &PlanningConfig,
    ) -> Vec<DecoupleEvaluation> {
        let _perf = PerfGuard::new("decouple_evaluate");
        candidates
            .iter()
            .map(|candidate| {
                let mut copy = tree.clone();
                let pass = self.plan(&mut copy, candidate, templates, config);
                self.measure(&copy, candidate, &pass.anomalies)
            })
            .collect()
    }

    fn measure(&self, tree: &SupplyTree, decouple: &[NodeId], anomalies: &[Anomaly]) -> DecoupleEvaluation {
        let members: HashSet<NodeId> = decouple.iter().copied().collect();
        let mut inventory_lot_weeks = 0;
        let mut buffer_lot_weeks = 0;
        for (id, node) in tree.nodes() {
            let held = node.psi(Layer::Supply).bucket_len(Bucket::Inventory);
            inventory_lot_weeks += held;
            if members.contains(&id) {
                buffer_lot_weeks += held;
            }
        }
        let totals = AnomalyTotals::from_anomalies(anomalies);
        DecoupleEvaluation {
            decouple_nodes: decouple.iter().map(|id| tree.node(*id).name.clone()).collect(),
            inventory_lot_weeks,
            buffer_lot_weeks,
            under_supplied_lots: totals.under_supply,
            range_overflows: totals.range_overflow,
            capacity_shortfalls: totals.capacity_shortfall,
        }
    }
}

impl Default for DecouplePlanner {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// PSI 供需平衡引擎 - 规划编排器
// ==========================================
// 用途: 协调各引擎的执行顺序
// 流程: 日历 -> 森林 -> 分配 -> 休假周/播种 -> 需求层 -> 供给层 -> 校验 -> 调达侧
// 红线: 配置类错误立即返回;单节点异常只记录,不中断整棵树
// ==========================================

use crate::config::{PlanningConfig, PlanningConfigReader};
use crate::domain::calendar::CalendarIndex;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::node::NodeId;
use crate::domain::records::{PlanningInput, SnapshotRow};
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer};
use crate::engine::decouple::{DecoupleEvaluation, DecouplePlanner};
use crate::engine::report::{Anomaly, RunReport};
use crate::engine::seeding::PsiSeeder;
use crate::engine::snapshot::psi_snapshot;
use crate::engine::walker::TreeWalker;
use crate::perf::PerfGuard;
use crate::validation::TreeValidator;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

// ==========================================
// PlanningOutcome - 规划结果
// ==========================================

/// 单产品结果
#[derive(Debug, Clone)]
pub struct ProductOutcome {
    /// 推演后的树 (两层缓冲区)
    pub tree: SupplyTree,

    /// 运行报告
    pub report: RunReport,

    /// 候选解耦方案评估 (未开启时为空)
    pub candidates: Vec<DecoupleEvaluation>,

    /// 调达侧树 (根节点承接出荷侧根节点的供给层 P)
    pub inbound: Option<SupplyTree>,
}

#[derive(Debug, Clone)]
pub struct PlanningOutcome {
    pub calendar: CalendarIndex,
    pub products: BTreeMap<String, ProductOutcome>,
}

impl PlanningOutcome {
    /// 某产品的 PSI 快照
    pub fn snapshot(&self, product: &str) -> PlanningResult<Vec<SnapshotRow>> {
        let outcome = self
            .products
            .get(product)
            .ok_or_else(|| PlanningError::UnknownProduct(product.to_string()))?;
        psi_snapshot(&outcome.tree, &self.calendar)
    }

    /// 某产品调达侧的 PSI 快照 (无调达树时为空)
    pub fn inbound_snapshot(&self, product: &str) -> PlanningResult<Vec<SnapshotRow>> {
        let outcome = self
            .products
            .get(product)
            .ok_or_else(|| PlanningError::UnknownProduct(product.to_string()))?;
        match &outcome.inbound {
            Some(tree) => psi_snapshot(tree, &self.calendar),
            None => Ok(Vec::new()),
        }
    }

    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.products.values().map(|p| &p.report)
    }
}

// ==========================================
// PsiOrchestrator - 规划编排器
// ==========================================
pub struct PsiOrchestrator {
    config: PlanningConfig,
    config_snapshot: String,
    seeder: PsiSeeder,
    walker: TreeWalker,
    planner: DecouplePlanner,
}

impl PsiOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 规划参数
    pub fn new(config: PlanningConfig) -> Self {
        let config_snapshot = serde_json::to_string(&config).unwrap_or_else(|_| "{}".to_string());
        Self {
            config,
            config_snapshot,
            seeder: PsiSeeder::new(),
            walker: TreeWalker::new(),
            planner: DecouplePlanner::new(),
        }
    }

    /// 从配置读取器创建
    pub fn from_reader<C>(reader: &C) -> PlanningResult<Self>
    where
        C: PlanningConfigReader + ?Sized,
    {
        let config = reader
            .load_planning_config()
            .map_err(|e| PlanningError::Other(anyhow::anyhow!("加载规划配置失败: {}", e)))?;
        Ok(Self::new(config))
    }

    /// 覆盖写入报告的配置快照 (例如 ConfigManager::get_config_snapshot 的结果)
    pub fn with_config_snapshot(mut self, snapshot: String) -> Self {
        self.config_snapshot = snapshot;
        self
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行完整规划
    ///
    /// # 参数
    /// - input: 树定义 / 需求 / 日历 / 休假 / 模板 / 确认出荷 / 解耦点
    ///
    /// # 返回
    /// - Ok(PlanningOutcome): 每个产品的推演结果与报告
    /// - Err(PlanningError): 配置类错误 (日历缺失、树根不唯一、负提前期等)
    #[instrument(skip(self, input), fields(
        tree_rows = input.tree.len(),
        demand_rows = input.demand.len()
    ))]
    pub fn run(&self, input: PlanningInput) -> PlanningResult<PlanningOutcome> {
        let _perf = PerfGuard::new("planning_run");

        // ==========================================
        // 步骤1: 日历与森林
        // ==========================================
        let calendar = self.build_calendar(&input)?;
        let forest = SupplyTree::build_forest(&input.tree)?;
        let mut inbound_forest = SupplyTree::build_forest(&input.inbound_tree)?;
        self.check_products(&forest, &inbound_forest, &input)?;

        info!(
            products = forest.len(),
            horizon = calendar.len(),
            "开始执行规划流程"
        );

        let mut products = BTreeMap::new();
        for (product, tree) in forest {
            let inbound = inbound_forest.remove(&product);
            let outcome = self.run_product(tree, inbound, &calendar, &input)?;
            products.insert(product, outcome);
        }

        Ok(PlanningOutcome { calendar, products })
    }

    fn run_product(
        &self,
        mut tree: SupplyTree,
        inbound: Option<SupplyTree>,
        calendar: &CalendarIndex,
        input: &PlanningInput,
    ) -> PlanningResult<ProductOutcome> {
        let product = tree.product().to_string();
        let mut report = RunReport::new(&product, calendar.len(), tree.len());
        report.config_snapshot = self.config_snapshot.clone();

        // ==========================================
        // 步骤2: 分配与播种
        // ==========================================
        debug!(product = %product, "步骤2: 分配缓冲区并播种");
        let truncated = tree.allocate(calendar.len());
        report.record(
            truncated
                .into_iter()
                .map(|(id, layer, lots)| Anomaly::Truncated {
                    node: tree.node(id).name.clone(),
                    layer,
                    lots: lots.len(),
                })
                .collect(),
        );

        self.seeder.apply_vacations(&mut tree, &input.vacations)?;
        let seeded = self.seeder.seed_demand(&mut tree, calendar, &input.demand)?;
        report.record(seeded.anomalies);
        let confirmed = self.seeder.apply_confirmed(&mut tree, calendar, &input.confirmed_shipments)?;
        report.record(confirmed.anomalies);
        let templates = self.seeder.seed_templates(&tree, calendar, &input.templates)?;

        // ==========================================
        // 步骤3: 需求层 (预测)
        // ==========================================
        debug!(product = %product, "步骤3: 需求层推演");
        let demand = self.walker.demand_pass(&mut tree, &self.config);
        report.record(demand.anomalies);

        // ==========================================
        // 步骤4: 供给层 (推拉)
        // ==========================================
        let decouple = self.decouple_set(&tree, input)?;
        debug!(product = %product, decouple = ?decouple, "步骤4: 供给层推演");

        // 候选评估需要在供给层推演前的基准树上进行
        let candidates = if input.evaluate_candidates {
            let sets = self.planner.candidate_sets(&tree);
            self.planner.evaluate(&tree, &sets, &templates, &self.config)
        } else {
            Vec::new()
        };

        let supply = self.planner.plan(&mut tree, &decouple, &templates, &self.config);
        report.record(supply.anomalies);
        report.decouple_nodes = decouple.iter().map(|id| tree.node(*id).name.clone()).collect();

        // ==========================================
        // 步骤5: 校验
        // ==========================================
        let sides = self.planner.classify(&tree, &decouple);
        report.validation = TreeValidator::new(self.config.validation.clone())
            .validate(&tree, &sides, &report.anomalies);

        // ==========================================
        // 步骤6: 调达侧 (逆向计划)
        // ==========================================
        let inbound = match inbound {
            Some(inbound) => Some(self.plan_inbound(inbound, &tree, input, &mut report)?),
            None => None,
        };

        info!(
            product = %product,
            run_id = %report.run_id,
            under_supply = report.totals.under_supply,
            range_overflow = report.totals.range_overflow,
            findings = report.validation.findings.len(),
            "产品规划完成"
        );

        Ok(ProductOutcome {
            tree,
            report,
            candidates,
            inbound,
        })
    }

    /// 调达侧推演
    ///
    /// 出荷侧根节点的供给层 P (生产计划) 成为调达侧根节点两层的 S,
    /// 再由先序遍历逐级下发到供应商节点
    ///
    /// # 返回
    /// - `Err(InboundRootMismatch)`: 调达侧根节点名与出荷侧不一致
    fn plan_inbound(
        &self,
        mut inbound: SupplyTree,
        outbound: &SupplyTree,
        input: &PlanningInput,
        report: &mut RunReport,
    ) -> PlanningResult<SupplyTree> {
        let outbound_root = outbound.node(outbound.root());
        let inbound_root = inbound.root();
        if inbound.node(inbound_root).name != outbound_root.name {
            return Err(PlanningError::InboundRootMismatch {
                product: outbound.product().to_string(),
                outbound: outbound_root.name.clone(),
                inbound: inbound.node(inbound_root).name.clone(),
            });
        }
        debug!(product = %outbound.product(), nodes = inbound.len(), "步骤6: 调达侧推演");

        inbound.allocate(outbound.horizon());
        self.seeder.apply_vacations(&mut inbound, &input.inbound_vacations)?;

        let production: Vec<(usize, Vec<_>)> = outbound_root
            .psi(Layer::Supply)
            .bucket_weeks(Bucket::Arrival)
            .filter(|(_, lots)| !lots.is_empty())
            .map(|(w, lots)| (w, lots.to_vec()))
            .collect();
        for layer in Layer::ALL {
            let buffer = inbound.node_mut(inbound_root).psi_mut(layer);
            buffer.clear_bucket(Bucket::Ship);
            for (week, lots) in &production {
                for lot in lots {
                    buffer.insert(*week, Bucket::Ship, lot.clone());
                }
            }
        }

        for layer in Layer::ALL {
            let pass = self.walker.preorder_pass(&mut inbound, layer, &self.config);
            report.record(pass.anomalies);
        }
        report.inbound_node_count = inbound.len();
        Ok(inbound)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 日历表优先;否则按规划期声明生成
    fn build_calendar(&self, input: &PlanningInput) -> PlanningResult<CalendarIndex> {
        if !input.calendar.is_empty() {
            let calendar = CalendarIndex::from_rows(&input.calendar)?;
            if let Some(h) = input.horizon {
                if h.weeks != calendar.len() {
                    warn!(
                        declared = h.weeks,
                        calendar = calendar.len(),
                        "规划期声明与日历表长度不一致,以日历表为准"
                    );
                }
            }
            return Ok(calendar);
        }
        match input.horizon {
            Some(h) => CalendarIndex::iso_weeks(h.start_year, h.start_week, h.weeks),
            None => Err(PlanningError::FieldValueError {
                field: "calendar".to_string(),
                message: "日历表与规划期声明均未提供".to_string(),
            }),
        }
    }

    /// 输入行引用的产品必须在树定义中出现
    fn check_products(
        &self,
        forest: &BTreeMap<String, SupplyTree>,
        inbound_forest: &BTreeMap<String, SupplyTree>,
        input: &PlanningInput,
    ) -> PlanningResult<()> {
        let referenced: BTreeSet<&str> = input
            .demand
            .iter()
            .map(|r| r.product.as_str())
            .chain(input.vacations.iter().map(|r| r.product.as_str()))
            .chain(input.templates.iter().map(|r| r.product.as_str()))
            .chain(input.confirmed_shipments.iter().map(|r| r.product.as_str()))
            .chain(input.decouple_nodes.keys().map(|k| k.as_str()))
            .chain(inbound_forest.keys().map(|k| k.as_str()))
            .chain(input.inbound_vacations.iter().map(|r| r.product.as_str()))
            .collect();
        match referenced.into_iter().find(|p| !forest.contains_key(*p)) {
            Some(p) => Err(PlanningError::UnknownProduct(p.to_string())),
            None => Ok(()),
        }
    }

    /// 解耦点: 输入指定 > 配置默认 (仅取本树存在的节点) > 根节点
    fn decouple_set(&self, tree: &SupplyTree, input: &PlanningInput) -> PlanningResult<Vec<NodeId>> {
        if let Some(names) = input.decouple_nodes.get(tree.product()) {
            return self.planner.resolve(tree, names);
        }

        let defaults: Vec<String> = self
            .config
            .default_decouple_nodes
            .iter()
            .filter(|n| tree.find(n).is_some())
            .cloned()
            .collect();
        if defaults.is_empty() {
            return Ok(vec![tree.root()]);
        }
        self.planner.resolve(tree, &defaults)
    }
}

impl Default for PsiOrchestrator {
    fn default() -> Self {
        Self::new(PlanningConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{DemandRow, PlanningHorizon, TreeRow};
    use crate::domain::types::{Bucket, Layer};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_input() -> PlanningInput {
        let row = |parent: &str, child: &str, lt: i64| TreeRow {
            parent_name: parent.to_string(),
            child_name: child.to_string(),
            product_name: "RICE".to_string(),
            lead_time_weeks: lt,
            safety_stock_days: 0,
            lot_size: 1,
        };
        PlanningInput {
            tree: vec![row("plant", "dc", 1), row("dc", "shop_a", 1), row("dc", "shop_b", 0)],
            demand: vec![
                DemandRow {
                    product: "RICE".into(),
                    node: "shop_a".into(),
                    iso_year: 2025,
                    iso_week: 6,
                    lot_count: Some(2),
                    ..Default::default()
                },
                DemandRow {
                    product: "RICE".into(),
                    node: "shop_b".into(),
                    iso_year: 2025,
                    iso_week: 8,
                    quantity: Some(1),
                    ..Default::default()
                },
            ],
            horizon: Some(PlanningHorizon {
                start_year: 2025,
                start_week: 1,
                weeks: 16,
            }),
            ..Default::default()
        }
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_run_plans_every_product_and_validates() {
        let outcome = PsiOrchestrator::default().run(create_test_input()).unwrap();
        assert_eq!(outcome.calendar.len(), 16);

        let rice = &outcome.products["RICE"];
        assert_eq!(rice.report.decouple_nodes, vec!["plant".to_string()]);
        assert!(rice.report.validation.passed(), "{:?}", rice.report.validation.findings);
        assert_eq!(rice.report.validation.total_lots, 3);
        assert!(rice.candidates.is_empty());

        // 三个批次都到达了根节点需求层 S
        let plant = rice.tree.node(rice.tree.root());
        assert_eq!(plant.psi(Layer::Demand).bucket_len(Bucket::Ship), 3);
    }

    #[test]
    fn test_snapshot_covers_planned_tree() {
        let outcome = PsiOrchestrator::default().run(create_test_input()).unwrap();
        let rows = outcome.snapshot("RICE").unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.product == "RICE"));
        assert_eq!(rows[0].node, "plant");
        assert!(matches!(
            outcome.snapshot("WHEAT"),
            Err(PlanningError::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_explicit_decouple_nodes_override_default() {
        let mut input = create_test_input();
        input.decouple_nodes.insert("RICE".into(), vec!["dc".into()]);
        let outcome = PsiOrchestrator::default().run(input).unwrap();
        assert_eq!(outcome.products["RICE"].report.decouple_nodes, vec!["dc".to_string()]);
    }

    #[test]
    fn test_unknown_decouple_node_is_rejected() {
        let mut input = create_test_input();
        input.decouple_nodes.insert("RICE".into(), vec!["nowhere".into()]);
        assert!(matches!(
            PsiOrchestrator::default().run(input),
            Err(PlanningError::UnknownDecoupleNode { .. })
        ));
    }

    #[test]
    fn test_configured_default_decouple_falls_back_to_root() {
        let config = PlanningConfig {
            default_decouple_nodes: vec!["missing".into()],
            ..Default::default()
        };
        let outcome = PsiOrchestrator::new(config).run(create_test_input()).unwrap();
        assert_eq!(outcome.products["RICE"].report.decouple_nodes, vec!["plant".to_string()]);
    }

    #[test]
    fn test_demand_for_unknown_product_is_rejected() {
        let mut input = create_test_input();
        input.demand[0].product = "WHEAT".into();
        assert!(matches!(
            PsiOrchestrator::default().run(input),
            Err(PlanningError::UnknownProduct(p)) if p == "WHEAT"
        ));
    }

    #[test]
    fn test_missing_calendar_and_horizon_is_rejected() {
        let mut input = create_test_input();
        input.horizon = None;
        assert!(matches!(
            PsiOrchestrator::default().run(input),
            Err(PlanningError::FieldValueError { .. })
        ));
    }

    #[test]
    fn test_candidate_evaluation_leaves_plan_untouched() {
        let baseline = PsiOrchestrator::default().run(create_test_input()).unwrap();

        let mut input = create_test_input();
        input.evaluate_candidates = true;
        let evaluated = PsiOrchestrator::default().run(input).unwrap();

        let rice = &evaluated.products["RICE"];
        assert!(!rice.candidates.is_empty());
        assert_eq!(
            baseline.snapshot("RICE").unwrap(),
            evaluated.snapshot("RICE").unwrap()
        );
    }
}

// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use psi_planner::domain::records::{
    ConfirmedShipmentRow, DemandRow, PlanningHorizon, PlanningInput, TemplateRow, TreeRow,
    VacationRow,
};
use psi_planner::domain::{Bucket, Layer, LotId, SupplyTree};

// ==========================================
// ScenarioBuilder - 场景构建器
// ==========================================

pub struct ScenarioBuilder {
    product: String,
    input: PlanningInput,
}

impl ScenarioBuilder {
    pub fn new(product: &str) -> Self {
        Self {
            product: product.to_string(),
            input: PlanningInput {
                horizon: Some(PlanningHorizon {
                    start_year: 2025,
                    start_week: 1,
                    weeks: 20,
                }),
                ..Default::default()
            },
        }
    }

    /// 规划期 (ISO 年/周起点 + 周数)
    pub fn horizon(mut self, start_year: i32, start_week: u32, weeks: usize) -> Self {
        self.input.horizon = Some(PlanningHorizon {
            start_year,
            start_week,
            weeks,
        });
        self
    }

    /// 父子边,提前期作用于子节点
    pub fn edge(self, parent: &str, child: &str, lead_time_weeks: i64) -> Self {
        self.edge_with(parent, child, lead_time_weeks, 0)
    }

    pub fn edge_with(mut self, parent: &str, child: &str, lead_time_weeks: i64, safety_stock_days: i64) -> Self {
        self.input.tree.push(TreeRow {
            parent_name: parent.to_string(),
            child_name: child.to_string(),
            product_name: self.product.clone(),
            lead_time_weeks,
            safety_stock_days,
            lot_size: 1,
        });
        self
    }

    /// 声明根节点自身属性
    pub fn root(mut self, name: &str, lead_time_weeks: i64) -> Self {
        self.input.tree.push(TreeRow {
            parent_name: String::new(),
            child_name: name.to_string(),
            product_name: self.product.clone(),
            lead_time_weeks,
            safety_stock_days: 0,
            lot_size: 1,
        });
        self
    }

    /// 叶子需求 (显式批次号)
    pub fn demand(mut self, node: &str, iso_year: i32, iso_week: u32, lots: &[&str]) -> Self {
        self.input.demand.push(DemandRow {
            product: self.product.clone(),
            node: node.to_string(),
            iso_year,
            iso_week,
            lot_ids: lots.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        });
        self
    }

    /// 叶子需求 (按批次数生成批次号)
    pub fn demand_count(mut self, node: &str, iso_year: i32, iso_week: u32, count: u32) -> Self {
        self.input.demand.push(DemandRow {
            product: self.product.clone(),
            node: node.to_string(),
            iso_year,
            iso_week,
            lot_count: Some(count),
            ..Default::default()
        });
        self
    }

    pub fn vacation(mut self, node: &str, weeks: &[usize]) -> Self {
        self.input.vacations.push(VacationRow {
            product: self.product.clone(),
            node: node.to_string(),
            week_indices: weeks.to_vec(),
        });
        self
    }

    pub fn template(mut self, node: &str, iso_year: i32, iso_week: u32, capacity_lot_count: u32) -> Self {
        self.input.templates.push(TemplateRow {
            product: self.product.clone(),
            node: node.to_string(),
            iso_year,
            iso_week,
            capacity_lot_count,
        });
        self
    }

    pub fn confirmed(mut self, node: &str, iso_year: i32, iso_week: u32, lots: &[&str]) -> Self {
        self.input.confirmed_shipments.push(ConfirmedShipmentRow {
            product: self.product.clone(),
            node: node.to_string(),
            iso_year,
            iso_week,
            lot_ids: lots.iter().map(|l| l.to_string()).collect(),
        });
        self
    }

    /// 调达侧父子边 (父节点为需求方,子节点为供应方)
    pub fn inbound_edge(mut self, parent: &str, child: &str, lead_time_weeks: i64) -> Self {
        self.input.inbound_tree.push(TreeRow {
            parent_name: parent.to_string(),
            child_name: child.to_string(),
            product_name: self.product.clone(),
            lead_time_weeks,
            safety_stock_days: 0,
            lot_size: 1,
        });
        self
    }

    pub fn inbound_vacation(mut self, node: &str, weeks: &[usize]) -> Self {
        self.input.inbound_vacations.push(VacationRow {
            product: self.product.clone(),
            node: node.to_string(),
            week_indices: weeks.to_vec(),
        });
        self
    }

    pub fn decouple(mut self, nodes: &[&str]) -> Self {
        self.input
            .decouple_nodes
            .insert(self.product.clone(), nodes.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn evaluate_candidates(mut self) -> Self {
        self.input.evaluate_candidates = true;
        self
    }

    pub fn build(self) -> PlanningInput {
        self.input
    }

    /// 仅构建已分配缓冲区的树 (不播种)
    pub fn build_tree(self) -> SupplyTree {
        let weeks = self.input.horizon.map(|h| h.weeks).unwrap_or(20);
        let mut tree = SupplyTree::build(&self.product, &self.input.tree).unwrap();
        tree.allocate(weeks);
        tree
    }
}

// ==========================================
// 缓冲区断言辅助
// ==========================================

/// 向节点某层某桶直接放入批次
pub fn put_lots(tree: &mut SupplyTree, node: &str, layer: Layer, week: usize, bucket: Bucket, lots: &[&str]) {
    let id = tree.node_id(node).unwrap();
    for lot in lots {
        tree.node_mut(id).psi_mut(layer).insert(week, bucket, LotId::new(*lot));
    }
}

/// 读取节点某层某周某桶的批次号
pub fn lots_at(tree: &SupplyTree, node: &str, layer: Layer, week: usize, bucket: Bucket) -> Vec<String> {
    let id = tree.node_id(node).unwrap();
    tree.node(id)
        .psi(layer)
        .lots(week, bucket)
        .iter()
        .map(|l| l.to_string())
        .collect()
}

/// 节点某层全部缓冲区内容 (用于前后对比)
pub fn dump_layer(tree: &SupplyTree, layer: Layer) -> Vec<(String, usize, Bucket, Vec<String>)> {
    let mut out = Vec::new();
    for id in tree.preorder() {
        let node = tree.node(id);
        let psi = node.psi(layer);
        for week in 0..psi.horizon() {
            for bucket in Bucket::ALL {
                let lots: Vec<String> = psi.lots(week, bucket).iter().map(|l| l.to_string()).collect();
                if !lots.is_empty() {
                    out.push((node.name.clone(), week, bucket, lots));
                }
            }
        }
    }
    out
}

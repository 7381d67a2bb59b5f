// ==========================================
// PSI 供需平衡引擎 - 输入/输出记录
// ==========================================
// 职责: 外部 ETL 产出的输入行与快照输出行
// 输入: 树定义 (出荷侧 + 调达侧) / 需求 / 日历 / 休假周 / 生产模板 / 确认出荷
// 输出: PSI 快照行
// ==========================================

use crate::domain::types::{Bucket, Layer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_lot_size() -> u32 {
    1
}

// ==========================================
// 输入记录
// ==========================================

/// 树定义行 (一行一条父子边)
///
/// parent_name 为空时表示声明根节点自身的属性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRow {
    #[serde(default)]
    pub parent_name: String,
    pub child_name: String,
    pub product_name: String,
    // 有符号类型: 负值需要作为配置错误报告,而不是在反序列化时被吞掉
    #[serde(default)]
    pub lead_time_weeks: i64,
    #[serde(default)]
    pub safety_stock_days: i64,
    #[serde(default = "default_lot_size")]
    pub lot_size: u32,
}

/// 叶子节点周需求行
///
/// lot_ids 优先;为空时按 lot_count 或 quantity/lot_size 生成批次号
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemandRow {
    pub product: String,
    pub node: String,
    pub iso_year: i32,
    pub iso_week: u32,
    #[serde(default)]
    pub lot_ids: Vec<String>,
    #[serde(default)]
    pub lot_count: Option<u32>,
    #[serde(default)]
    pub quantity: Option<u64>,
}

/// 日历行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub week_index: usize,
    pub iso_year: i32,
    pub iso_week: u32,
}

/// 节点休假周
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationRow {
    pub product: String,
    pub node: String,
    pub week_indices: Vec<usize>,
}

/// 生产模板行 (周产能,单位: 批次)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRow {
    pub product: String,
    pub node: String,
    pub iso_year: i32,
    pub iso_week: u32,
    pub capacity_lot_count: u32,
}

/// 确认出荷行 (实际 S 回馈)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedShipmentRow {
    pub product: String,
    pub node: String,
    pub iso_year: i32,
    pub iso_week: u32,
    pub lot_ids: Vec<String>,
}

/// 规划期声明 (无日历表时使用)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanningHorizon {
    pub start_year: i32,
    pub start_week: u32,
    pub weeks: usize,
}

/// 一次规划调用的全部输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningInput {
    pub tree: Vec<TreeRow>,
    #[serde(default)]
    pub demand: Vec<DemandRow>,
    #[serde(default)]
    pub calendar: Vec<CalendarRow>,
    #[serde(default)]
    pub horizon: Option<PlanningHorizon>,
    #[serde(default)]
    pub vacations: Vec<VacationRow>,
    #[serde(default)]
    pub templates: Vec<TemplateRow>,
    #[serde(default)]
    pub confirmed_shipments: Vec<ConfirmedShipmentRow>,
    /// product -> 解耦节点名列表 (缺省使用配置或根节点)
    #[serde(default)]
    pub decouple_nodes: BTreeMap<String, Vec<String>>,
    /// 是否评估由叶到根的全部候选解耦方案
    #[serde(default)]
    pub evaluate_candidates: bool,
    /// 调达侧 (供应商) 树定义;根节点名须与同产品出荷侧根节点一致
    #[serde(default)]
    pub inbound_tree: Vec<TreeRow>,
    /// 调达侧节点休假周
    #[serde(default)]
    pub inbound_vacations: Vec<VacationRow>,
}

// ==========================================
// 输出记录
// ==========================================

/// PSI 快照行: 每批次每桶每周一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub product: String,
    pub node: String,
    pub layer: Layer,
    pub bucket: Bucket,
    pub week_index: usize,
    pub iso_year: i32,
    pub iso_week: u32,
    pub lot_id: String,
}

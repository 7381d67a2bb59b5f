// ==========================================
// PSI 供需平衡引擎 - 规划错误类型
// ==========================================
// 职责: 致命的配置类错误(立即返回给调用方)
// 说明: 欠供/越界/重复批次等可恢复情况不走错误通道,
//       记录在 engine::report::Anomaly 中
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 规划错误类型
#[derive(Error, Debug)]
pub enum PlanningError {
    // ===== 日历错误 =====
    #[error("日历缺少条目: iso_year={iso_year}, iso_week={iso_week}")]
    MissingCalendarEntry { iso_year: i32, iso_week: u32 },

    #[error("无效的 ISO 周: iso_year={iso_year}, iso_week={iso_week}")]
    InvalidIsoWeek { iso_year: i32, iso_week: u32 },

    #[error("日历不连续: 第 {position} 行 week_index={week_index}")]
    NonDenseCalendar { position: usize, week_index: usize },

    #[error("日历顺序错误: week_index={week_index} 早于前一周")]
    NonChronologicalCalendar { week_index: usize },

    #[error("周索引越界: week_index={week_index}, horizon={horizon}")]
    WeekOutOfHorizon { week_index: usize, horizon: usize },

    #[error("规划期长度不一致: expected={expected}, actual={actual}")]
    HorizonMismatch { expected: usize, actual: usize },

    // ===== 树结构错误 =====
    #[error("树根不唯一: product={product}, 候选根={candidates:?}")]
    MultipleRoots {
        product: String,
        candidates: Vec<String>,
    },

    #[error("树没有根节点: product={product}")]
    NoRoot { product: String },

    #[error("节点存在多个父节点: product={product}, node={node}")]
    DuplicateParent { product: String, node: String },

    #[error("节点不可达(存在环): product={product}, nodes={nodes:?}")]
    UnreachableNodes { product: String, nodes: Vec<String> },

    #[error("负的提前期: node={node}, lead_time_weeks={value}")]
    NegativeLeadTime { node: String, value: i64 },

    #[error("负的安全库存: node={node}, safety_stock_days={value}")]
    NegativeSafetyStock { node: String, value: i64 },

    #[error("调达侧根节点与出荷侧根节点不一致: product={product}, outbound={outbound}, inbound={inbound}")]
    InboundRootMismatch {
        product: String,
        outbound: String,
        inbound: String,
    },

    #[error("未知产品: {0}")]
    UnknownProduct(String),

    #[error("未知节点: product={product}, node={node}")]
    UnknownNode { product: String, node: String },

    // ===== 输入数据错误 =====
    #[error("需求只能挂在叶子节点: product={product}, node={node}")]
    DemandOnInteriorNode { product: String, node: String },

    #[error("未知的解耦节点: product={product}, node={node}")]
    UnknownDecoupleNode { product: String, node: String },

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;

// ==========================================
// PSI 供需平衡引擎 - 核心库
// ==========================================
// 系统定位: 多层级供应链的周次 PSI 推演 (批次级追踪)
// 输入: 树定义 / 需求 / 日历 / 休假 / 模板 (外部 ETL 产出)
// 输出: PSI 快照 + 运行报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 批次、节点树、PSI 缓冲区
pub mod domain;

// 引擎层 - 推演规则
pub mod engine;

// 校验层 - 全树不变量
pub mod validation;

// 配置层 - 规划参数
pub mod config;

// 文件读写 - 场景输入与快照/报告输出
pub mod export;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AggregationPolicy, Bucket, Layer, LotFormatMode, NodeSide, ShiftDirection};

// 领域实体
pub use domain::{
    CalendarIndex, LotId, PlanNode, PlanningError, PlanningInput, PlanningResult, PsiBuffer,
    SnapshotRow, SupplyTree,
};

// 引擎
pub use engine::{
    psi_snapshot, Anomaly, DecouplePlanner, PlanningOutcome, PsiOrchestrator, RunReport,
    TreeWalker,
};

// 配置
pub use config::{ConfigManager, PlanningConfig, PlanningConfigReader};

// 校验
pub use validation::{TreeValidator, ValidationReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "PSI 供需平衡引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

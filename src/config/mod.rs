// ==========================================
// PSI 供需平衡引擎 - 配置层
// ==========================================
// 职责: 规划参数管理,支持文件加载与环境变量覆写
// ==========================================

pub mod config_manager;
pub mod planning_config_trait;
pub mod planning_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use planning_config_trait::PlanningConfigReader;
pub use planning_profile::{PlanningConfig, ValidationConfig};

// ==========================================
// PSI 供需平衡引擎 - 规划配置读取 Trait
// ==========================================
// 职责: 定义编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::planning_profile::{PlanningConfig, ValidationConfig};
use crate::domain::types::{AggregationPolicy, LotFormatMode, ShiftDirection};
use std::error::Error;

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// 用途: 编排器/批处理入口读取规划参数
// 实现者: ConfigManager（内存键值 + 环境变量覆写）
pub trait PlanningConfigReader: Send + Sync {
    // ===== 传播配置 =====

    /// 获取汇总策略
    ///
    /// # 默认值
    /// - REPLACE
    fn get_aggregation_policy(&self) -> Result<AggregationPolicy, Box<dyn Error>>;

    /// 获取需求侧 (S -> P) 平移方向
    ///
    /// # 默认值
    /// - FORWARD
    fn get_demand_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>>;

    /// 获取汇总侧 (子 P -> 父 S) 平移方向
    ///
    /// # 默认值
    /// - FORWARD
    fn get_aggregation_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>>;

    /// 获取默认解耦节点列表
    ///
    /// # 默认值
    /// - 空列表 (即使用根节点)
    fn get_default_decouple_nodes(&self) -> Result<Vec<String>, Box<dyn Error>>;

    // ===== 校验配置 =====

    /// 获取批次号校验模式
    ///
    /// # 默认值
    /// - LENIENT
    fn get_lot_format_mode(&self) -> Result<LotFormatMode, Box<dyn Error>>;

    /// 获取守恒校验容差 (批次数)
    ///
    /// # 默认值
    /// - 0
    fn get_conservation_tolerance(&self) -> Result<usize, Box<dyn Error>>;

    /// 组装完整规划配置
    fn load_planning_config(&self) -> Result<PlanningConfig, Box<dyn Error>> {
        Ok(PlanningConfig {
            aggregation_policy: self.get_aggregation_policy()?,
            demand_shift_direction: self.get_demand_shift_direction()?,
            aggregation_shift_direction: self.get_aggregation_shift_direction()?,
            default_decouple_nodes: self.get_default_decouple_nodes()?,
            validation: ValidationConfig {
                lot_format_mode: self.get_lot_format_mode()?,
                conservation_tolerance: self.get_conservation_tolerance()?,
            },
        })
    }
}

use crate::domain::types::{AggregationPolicy, LotFormatMode, ShiftDirection};
use serde::{Deserialize, Serialize};

/// 一次规划运行使用的参数集合
///
/// 由 ConfigManager 组装;也可直接在代码中构造
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 子节点 P 汇总到父节点 S 的策略
    #[serde(default = "default_aggregation_policy")]
    pub aggregation_policy: AggregationPolicy,

    /// S -> P 平移方向
    #[serde(default = "default_direction")]
    pub demand_shift_direction: ShiftDirection,

    /// 子 P -> 父 S 平移方向
    #[serde(default = "default_direction")]
    pub aggregation_shift_direction: ShiftDirection,

    /// 输入未指定时使用的解耦节点 (为空则取根节点)
    #[serde(default)]
    pub default_decouple_nodes: Vec<String>,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// 校验参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_lot_format_mode")]
    pub lot_format_mode: LotFormatMode,

    /// 守恒校验允许的批次数偏差
    #[serde(default)]
    pub conservation_tolerance: usize,
}

fn default_aggregation_policy() -> AggregationPolicy {
    AggregationPolicy::Replace
}

fn default_direction() -> ShiftDirection {
    ShiftDirection::Forward
}

fn default_lot_format_mode() -> LotFormatMode {
    LotFormatMode::Lenient
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            aggregation_policy: default_aggregation_policy(),
            demand_shift_direction: default_direction(),
            aggregation_shift_direction: default_direction(),
            default_decouple_nodes: Vec::new(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            lot_format_mode: default_lot_format_mode(),
            conservation_tolerance: 0,
        }
    }
}

// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use psi_planner::config::PlanningConfigReader;
use psi_planner::domain::{AggregationPolicy, LotFormatMode, ShiftDirection};
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub aggregation_policy: AggregationPolicy,
    pub demand_shift_direction: ShiftDirection,
    pub aggregation_shift_direction: ShiftDirection,
    pub default_decouple_nodes: Vec<String>,
    pub lot_format_mode: LotFormatMode,
    pub conservation_tolerance: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            aggregation_policy: AggregationPolicy::Replace,
            demand_shift_direction: ShiftDirection::Forward,
            aggregation_shift_direction: ShiftDirection::Forward,
            default_decouple_nodes: Vec::new(),
            lot_format_mode: LotFormatMode::Strict,
            conservation_tolerance: 0,
        }
    }
}

impl PlanningConfigReader for MockConfig {
    fn get_aggregation_policy(&self) -> Result<AggregationPolicy, Box<dyn Error>> {
        Ok(self.aggregation_policy)
    }

    fn get_demand_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>> {
        Ok(self.demand_shift_direction)
    }

    fn get_aggregation_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>> {
        Ok(self.aggregation_shift_direction)
    }

    fn get_default_decouple_nodes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(self.default_decouple_nodes.clone())
    }

    fn get_lot_format_mode(&self) -> Result<LotFormatMode, Box<dyn Error>> {
        Ok(self.lot_format_mode)
    }

    fn get_conservation_tolerance(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.conservation_tolerance)
    }
}

// ==========================================
// 配置管理集成测试
// ==========================================
// 测试目标: 验证配置文件加载、环境变量覆写与编排器接入
// 覆盖范围: JSON 文件、非法值回退、快照恢复、默认解耦点
// ==========================================

mod helpers;

use helpers::test_data_builder::ScenarioBuilder;
use psi_planner::config::{config_keys, ConfigManager, PlanningConfigReader};
use psi_planner::domain::{AggregationPolicy, LotFormatMode, ShiftDirection};
use psi_planner::engine::PsiOrchestrator;
use std::fs;

// ==========================================
// 测试辅助函数
// ==========================================

fn write_config(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.json");
    fs::write(&path, body).unwrap();
    (dir, path)
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_load_config_file_into_planning_config() {
    let (_dir, path) = write_config(
        r#"{
            "aggregation_policy": "ACCUMULATE",
            "demand_shift_direction": "BACKWARD",
            "lot_format_mode": "STRICT",
            "conservation_tolerance": 2,
            "default_decouple_nodes": ["dc"]
        }"#,
    );
    let manager = ConfigManager::from_json_file(&path).unwrap().with_env_prefix(None);
    let config = manager.load_planning_config().unwrap();

    assert_eq!(config.aggregation_policy, AggregationPolicy::Accumulate);
    assert_eq!(config.demand_shift_direction, ShiftDirection::Backward);
    assert_eq!(config.aggregation_shift_direction, ShiftDirection::Forward);
    assert_eq!(config.validation.lot_format_mode, LotFormatMode::Strict);
    assert_eq!(config.validation.conservation_tolerance, 2);
    assert_eq!(config.default_decouple_nodes, vec!["dc".to_string()]);
}

#[test]
fn test_malformed_values_fall_back_to_defaults() {
    let (_dir, path) = write_config(
        r#"{"aggregation_policy": "SOMETIMES", "conservation_tolerance": "many"}"#,
    );
    let manager = ConfigManager::from_json_file(&path).unwrap().with_env_prefix(None);

    assert_eq!(manager.get_aggregation_policy().unwrap(), AggregationPolicy::Replace);
    assert_eq!(manager.get_conservation_tolerance().unwrap(), 0);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigManager::from_json_file(dir.path().join("absent.json")).is_err());
}

#[test]
fn test_environment_overrides_file_value() {
    let (_dir, path) = write_config(r#"{"lot_format_mode": "LENIENT"}"#);
    std::env::set_var("PSI_CFG_IT_LOT_FORMAT_MODE", "STRICT");
    let manager = ConfigManager::from_json_file(&path)
        .unwrap()
        .with_env_prefix(Some("PSI_CFG_IT_"));

    assert_eq!(manager.get_lot_format_mode().unwrap(), LotFormatMode::Strict);
    std::env::remove_var("PSI_CFG_IT_LOT_FORMAT_MODE");
}

#[test]
fn test_snapshot_restores_into_fresh_manager() {
    let mut original = ConfigManager::new().with_env_prefix(None);
    original.set(config_keys::AGGREGATION_POLICY, "ACCUMULATE");
    original.set(config_keys::CONSERVATION_TOLERANCE, "3");
    let snapshot = original.get_config_snapshot().unwrap();

    let mut restored = ConfigManager::new().with_env_prefix(None);
    let count = restored.restore_config_from_snapshot(&snapshot).unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        restored.load_planning_config().unwrap(),
        original.load_planning_config().unwrap()
    );
}

#[test]
fn test_configured_decouple_node_reaches_orchestrator() {
    let (_dir, path) = write_config(r#"{"default_decouple_nodes": "dc"}"#);
    let manager = ConfigManager::from_json_file(&path).unwrap().with_env_prefix(None);
    let orchestrator = PsiOrchestrator::from_reader(&manager).unwrap();

    let input = ScenarioBuilder::new("TEA")
        .edge("plant", "dc", 1)
        .edge("dc", "shop", 1)
        .demand_count("shop", 2025, 3, 1)
        .build();
    let outcome = orchestrator.run(input).unwrap();

    assert_eq!(outcome.products["TEA"].report.decouple_nodes, vec!["dc".to_string()]);
}

// ==========================================
// psi-plan 批处理入口测试
// ==========================================
// 测试目标: 验证命令行参数、输出文件与退出码
// 覆盖范围: 正常场景、配置文件、非法场景
// ==========================================

use std::fs;
use std::process::Command;

fn fixture_path() -> String {
    format!("{}/tests/fixtures/small_scenario.json", env!("CARGO_MANIFEST_DIR"))
}

fn psi_plan() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_psi-plan"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_cli_writes_snapshot_per_product_and_report() {
    let out = tempfile::tempdir().unwrap();
    let output = psi_plan()
        .arg(fixture_path())
        .arg(out.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.path().join("psi_snapshot_RICE.csv").exists());
    assert!(out.path().join("psi_snapshot_SOY.csv").exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("run_report.json")).unwrap()).unwrap();
    assert_eq!(report["reports"].as_array().unwrap().len(), 2);
    assert_eq!(report["candidates"]["RICE"].as_array().unwrap().len(), 3);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.lines().next().unwrap().starts_with("product=RICE"));
}

#[test]
fn test_cli_embeds_config_file_in_report() {
    let out = tempfile::tempdir().unwrap();
    let config = out.path().join("planner.json");
    fs::write(&config, r#"{"lot_format_mode": "STRICT", "conservation_tolerance": 1}"#).unwrap();

    let output = psi_plan()
        .arg(fixture_path())
        .arg(out.path())
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("run_report.json")).unwrap()).unwrap();
    let snapshot = report["reports"][0]["config_snapshot"].as_str().unwrap();
    assert!(snapshot.contains("\"lot_format_mode\":\"STRICT\""));
}

#[test]
fn test_cli_fails_on_invalid_tree() {
    let out = tempfile::tempdir().unwrap();
    let scenario = out.path().join("bad.json");
    fs::write(
        &scenario,
        r#"{
            "tree": [{"parent_name": "plant", "child_name": "shop", "product_name": "RICE", "lead_time_weeks": -2}],
            "horizon": {"start_year": 2025, "start_week": 1, "weeks": 8}
        }"#,
    )
    .unwrap();

    let output = psi_plan().arg(&scenario).arg(out.path()).output().unwrap();
    assert!(!output.status.success());
    assert!(!out.path().join("run_report.json").exists());
}

#[test]
fn test_cli_without_arguments_prints_usage() {
    let output = psi_plan().output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("psi-plan"));
}

#[test]
fn test_cli_json_log_format_writes_json_lines_to_stderr() {
    let out = tempfile::tempdir().unwrap();
    let output = psi_plan()
        .env("RUST_LOG", "info")
        .env("PSI_PLAN_LOG_FORMAT", "json")
        .arg(fixture_path())
        .arg(out.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let first = stderr.lines().find(|l| !l.trim().is_empty()).unwrap();
    let line: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(line["level"], "INFO");
    // stdout 仍只有摘要
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

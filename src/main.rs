// ==========================================
// PSI 供需平衡引擎 - 批处理入口
// ==========================================
// 用法: psi-plan <scenario.json> [out_dir] [config.json]
// 输出: psi_snapshot_<product>.csv (+ psi_inbound_<product>.csv) + run_report.json
// 退出码: 规划配置错误时非零
// 日志: PSI_PLAN_LOG_FORMAT=json 时输出 JSON 行
// ==========================================

use anyhow::Context;
use psi_planner::config::ConfigManager;
use psi_planner::{export, logging, PsiOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "用法: psi-plan <scenario.json> [out_dir] [config.json]";

/// 日志格式开关
const LOG_FORMAT_ENV: &str = "PSI_PLAN_LOG_FORMAT";

fn main() -> ExitCode {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(v) if v.trim().eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("规划失败: {:#}", e);
            eprintln!("规划失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let scenario_path = args.next().map(PathBuf::from).context(USAGE)?;
    let out_dir = args
        .next()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config_path = args.next();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", psi_planner::APP_NAME, psi_planner::VERSION);
    tracing::info!("==================================================");

    // 配置: 文件 (可选) + 环境变量覆写
    let config = match &config_path {
        Some(path) => ConfigManager::from_json_file(path)
            .map_err(|e| anyhow::anyhow!("加载配置文件失败 {}: {}", path, e))?,
        None => ConfigManager::new(),
    };
    let snapshot = config
        .get_config_snapshot()
        .map_err(|e| anyhow::anyhow!("生成配置快照失败: {}", e))?;
    let orchestrator = PsiOrchestrator::from_reader(&config)?.with_config_snapshot(snapshot);

    let input = export::load_scenario(&scenario_path)?;
    let outcome = orchestrator
        .run(input)
        .with_context(|| format!("场景推演失败: {}", scenario_path.display()))?;

    let written = export::write_outputs(&out_dir, &outcome)?;
    tracing::info!(files = written.len(), out_dir = %out_dir.display(), "输出已写出");

    for report in outcome.reports() {
        println!("{}", report.summary_line());
    }
    Ok(())
}

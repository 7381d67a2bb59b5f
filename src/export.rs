// ==========================================
// PSI 供需平衡引擎 - 文件读写
// ==========================================
// 职责: 场景文件读取、PSI 快照 CSV (出荷侧/调达侧) 与运行报告 JSON 落盘
// 红线: 引擎层不做 I/O,文件操作只在此处与 bin 中出现
// ==========================================

use crate::domain::records::{PlanningInput, SnapshotRow};
use crate::engine::decouple::DecoupleEvaluation;
use crate::engine::orchestrator::PlanningOutcome;
use crate::engine::report::RunReport;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 报告文件名
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// 运行报告文件内容
#[derive(Debug, Serialize)]
pub struct RunReportFile<'a> {
    pub version: &'static str,
    pub reports: Vec<&'a RunReport>,
    /// product -> 候选解耦方案评估 (未开启评估的产品不出现)
    pub candidates: BTreeMap<&'a str, &'a [DecoupleEvaluation]>,
}

impl<'a> RunReportFile<'a> {
    pub fn from_outcome(outcome: &'a PlanningOutcome) -> Self {
        Self {
            version: crate::VERSION,
            reports: outcome.reports().collect(),
            candidates: outcome
                .products
                .iter()
                .filter(|(_, p)| !p.candidates.is_empty())
                .map(|(name, p)| (name.as_str(), p.candidates.as_slice()))
                .collect(),
        }
    }
}

/// 读取 JSON 场景文件
pub fn load_scenario(path: impl AsRef<Path>) -> anyhow::Result<PlanningInput> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("读取场景文件失败: {}", path.display()))?;
    let input: PlanningInput = serde_json::from_str(&raw)
        .with_context(|| format!("场景文件格式错误: {}", path.display()))?;
    Ok(input)
}

/// 快照文件名: psi_snapshot_<product>.csv
pub fn snapshot_file_name(product: &str) -> String {
    format!("psi_snapshot_{}.csv", product)
}

/// 调达侧快照文件名: psi_inbound_<product>.csv
pub fn inbound_file_name(product: &str) -> String {
    format!("psi_inbound_{}.csv", product)
}

/// 写出 PSI 快照 CSV (带表头)
///
/// # 返回
/// 写出的数据行数
pub fn write_snapshot_csv(path: impl AsRef<Path>, rows: &[SnapshotRow]) -> anyhow::Result<usize> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("创建快照文件失败: {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// 写出全部产品的快照与运行报告
///
/// # 返回
/// 已写出的文件路径 (快照按产品名排序,同产品调达侧紧随其后,报告在最后)
pub fn write_outputs(out_dir: impl AsRef<Path>, outcome: &PlanningOutcome) -> anyhow::Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)
        .with_context(|| format!("创建输出目录失败: {}", out_dir.display()))?;

    let mut written = Vec::new();
    for product in outcome.products.keys() {
        let rows = outcome.snapshot(product)?;
        let path = out_dir.join(snapshot_file_name(product));
        let count = write_snapshot_csv(&path, &rows)?;
        info!(product = %product, rows = count, path = %path.display(), "PSI 快照已写出");
        written.push(path);

        if outcome.products[product].inbound.is_some() {
            let rows = outcome.inbound_snapshot(product)?;
            let path = out_dir.join(inbound_file_name(product));
            let count = write_snapshot_csv(&path, &rows)?;
            info!(product = %product, rows = count, path = %path.display(), "调达侧快照已写出");
            written.push(path);
        }
    }

    let report_path = out_dir.join(RUN_REPORT_FILE);
    let body = serde_json::to_string_pretty(&RunReportFile::from_outcome(outcome))?;
    fs::write(&report_path, body)
        .with_context(|| format!("写出运行报告失败: {}", report_path.display()))?;
    written.push(report_path);

    Ok(written)
}

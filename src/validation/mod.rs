// ==========================================
// PSI 供需平衡引擎 - 校验层
// ==========================================
// 职责: 全树引用与数量不变量校验
// 输出: ValidationReport (违规以结构化结果返回,不抛错)
// ==========================================

mod conservation;
mod lot_format;
mod report;
mod uniqueness;


pub use conservation::ConservationValidator;
pub use lot_format::LotFormatValidator;
pub use report::{FindingKind, ValidationFinding, ValidationReport};
pub use uniqueness::{UniquenessCount, UniquenessValidator};

use crate::config::ValidationConfig;
use crate::domain::tree::SupplyTree;
use crate::domain::types::NodeSide;
use crate::engine::report::Anomaly;
use tracing::{info, warn};

// ==========================================
// TreeValidator - 校验入口
// ==========================================
pub struct TreeValidator {
    config: ValidationConfig,
}

impl TreeValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// 执行全部校验
    ///
    /// # 参数
    /// - `tree`: 已完成推演的树
    /// - `sides`: 供给层分区 (为空则跳过供给层守恒)
    /// - `anomalies`: 本次运行记录的异常 (用于越界/重复计数)
    pub fn validate(&self, tree: &SupplyTree, sides: &[NodeSide], anomalies: &[Anomaly]) -> ValidationReport {
        let uniqueness = UniquenessValidator::new().check(tree);
        let format_findings = LotFormatValidator::new(self.config.lot_format_mode).check(tree);
        let conservation = ConservationValidator::new(self.config.conservation_tolerance).check(tree, sides);

        let rejected_duplicates = anomalies
            .iter()
            .filter(|a| matches!(a, Anomaly::DuplicateLot { .. }))
            .count();
        let out_of_range_lots = anomalies
            .iter()
            .filter(|a| matches!(a, Anomaly::RangeOverflow { .. }))
            .count();

        let mut report = ValidationReport {
            total_lots: uniqueness.distinct_lots,
            total_entries: uniqueness.total_entries,
            duplicate_lots: uniqueness.duplicate_entries + rejected_duplicates,
            out_of_range_lots,
            malformed_lots: format_findings.len(),
            findings: Vec::new(),
        };
        report.findings.extend(uniqueness.findings);
        report.findings.extend(format_findings);
        report.findings.extend(conservation);

        if report.passed() {
            info!(
                product = %tree.product(),
                total_lots = report.total_lots,
                out_of_range = report.out_of_range_lots,
                "校验通过"
            );
        } else {
            warn!(
                product = %tree.product(),
                findings = report.findings.len(),
                malformed = report.malformed_lots,
                "校验发现违规"
            );
        }
        report
    }
}

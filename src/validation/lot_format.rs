// ==========================================
// PSI 供需平衡引擎 - 批次号格式校验
// ==========================================
// STRICT: {node}-{product}-{YYYY}W{WW}-{seq},产品段必须等于树的产品
// LENIENT: 非空且不含空白
// ==========================================

use crate::domain::lot::LotId;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer, LotFormatMode};
use crate::validation::report::{FindingKind, ValidationFinding};
use std::collections::HashSet;

pub struct LotFormatValidator {
    mode: LotFormatMode,
}

impl LotFormatValidator {
    pub fn new(mode: LotFormatMode) -> Self {
        Self { mode }
    }

    /// 单个批次号是否合格
    pub fn accepts(&self, lot: &LotId, product: &str) -> bool {
        match self.mode {
            LotFormatMode::Strict => lot.parse(product).is_some(),
            LotFormatMode::Lenient => lot.is_well_formed(),
        }
    }

    /// 检查全树批次号,每个不合格批次号只报告一次 (归属首次出现的节点)
    pub fn check(&self, tree: &SupplyTree) -> Vec<ValidationFinding> {
        let mut checked: HashSet<&LotId> = HashSet::new();
        let mut findings = Vec::new();

        for id in tree.preorder() {
            let node = tree.node(id);
            for layer in Layer::ALL {
                for bucket in Bucket::ALL {
                    for (_, lots) in node.psi(layer).bucket_weeks(bucket) {
                        for lot in lots {
                            if !checked.insert(lot) {
                                continue;
                            }
                            if !self.accepts(lot, tree.product()) {
                                findings.push(ValidationFinding {
                                    kind: FindingKind::LotFormat,
                                    node: node.name.clone(),
                                    layer: None,
                                    expected: 0,
                                    actual: 1,
                                    message: format!("批次号格式不符 ({}): {:?}", self.mode, lot.as_str()),
                                });
                            }
                        }
                    }
                }
            }
        }
        findings
    }
}

// ==========================================
// PSI 供需平衡引擎 - 批次唯一性校验
// ==========================================
// 职责: 对每个 (节点, 层, 桶, 周) 检查批次号是集合而非多重集
// 输出: 条目总数 / 重复数 / 不同批次号数
// ==========================================

use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer};
use crate::validation::report::{FindingKind, ValidationFinding};
use std::collections::HashSet;

/// 唯一性统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniquenessCount {
    pub total_entries: usize,
    pub duplicate_entries: usize,
    pub distinct_lots: usize,
    pub findings: Vec<ValidationFinding>,
}

pub struct UniquenessValidator {
    // 无状态校验器
}

impl UniquenessValidator {
    pub fn new() -> Self {
        Self {}
    }

    pub fn check(&self, tree: &SupplyTree) -> UniquenessCount {
        let mut count = UniquenessCount::default();
        let mut distinct = HashSet::new();

        for id in tree.preorder() {
            let node = tree.node(id);
            for layer in Layer::ALL {
                for bucket in Bucket::ALL {
                    for (week, lots) in node.psi(layer).bucket_weeks(bucket) {
                        let mut seen = HashSet::with_capacity(lots.len());
                        let mut dup = 0;
                        for lot in lots {
                            distinct.insert(lot);
                            if !seen.insert(lot) {
                                dup += 1;
                            }
                        }
                        count.total_entries += lots.len();
                        if dup > 0 {
                            count.duplicate_entries += dup;
                            count.findings.push(ValidationFinding {
                                kind: FindingKind::Uniqueness,
                                node: node.name.clone(),
                                layer: Some(layer),
                                expected: lots.len() - dup,
                                actual: lots.len(),
                                message: format!("第 {} 周 {} 桶存在 {} 个重复批次", week, bucket, dup),
                            });
                        }
                    }
                }
            }
        }

        count.distinct_lots = distinct.len();
        count
    }
}

impl Default for UniquenessValidator {
    fn default() -> Self {
        Self::new()
    }
}

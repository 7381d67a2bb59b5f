use crate::domain::types::Layer;
use serde::{Deserialize, Serialize};

// ==========================================
// ValidationFinding - 校验违规
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    Conservation, // 子节点 P 合计 != 父节点 S
    RoundTrip,    // 节点 S 数 != P 数
    Uniqueness,   // 同一 (周, 桶) 出现重复批次
    LotFormat,    // 批次号格式不符
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// 违规类型
    pub kind: FindingKind,

    /// 节点
    pub node: String,

    /// 层 (批次号格式违规不区分层)
    pub layer: Option<Layer>,

    /// 期望数量
    pub expected: usize,

    /// 实际数量
    pub actual: usize,

    /// 说明
    pub message: String,
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// 树内不同批次号数量
    pub total_lots: usize,

    /// 全部 (节点, 层, 桶, 周) 条目数
    pub total_entries: usize,

    /// 重复批次数 (存储内重复 + 被拒绝的重复插入)
    pub duplicate_lots: usize,

    /// 平移越界被钳制的批次数 (单独统计,不计为失败)
    pub out_of_range_lots: usize,

    /// 格式不符的批次数
    pub malformed_lots: usize,

    /// 超出容差的违规
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// 无违规
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

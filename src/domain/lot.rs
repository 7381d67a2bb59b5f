// ==========================================
// PSI 供需平衡引擎 - 批次标识
// ==========================================
// 职责: 批次号值对象(不可变,按身份追踪)
// 格式: {node}-{product}-{YYYY}W{WW}-{seq:03}
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 批次号
///
/// 对引擎而言是不透明字符串;只有生成与严格格式校验关心内部结构
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(String);

/// 严格格式解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotParts {
    pub node: String,
    pub product: String,
    pub iso_year: i32,
    pub iso_week: u32,
    pub seq: u32,
}

impl LotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 按 节点-产品-年W周-序号 生成批次号
    pub fn compose(node: &str, product: &str, iso_year: i32, iso_week: u32, seq: u32) -> Self {
        Self(format!(
            "{}-{}-{:04}W{:02}-{:03}",
            node, product, iso_year, iso_week, seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 按严格格式解析
    ///
    /// 节点名和产品名本身可能包含 '-',因此从右向左切分:
    /// 序号、年周固定在末尾两段,产品名由调用方给出
    ///
    /// # 参数
    /// - `product`: 期望的产品名
    ///
    /// # 返回
    /// - `Some(LotParts)`: 结构完整且产品段匹配
    /// - `None`: 不符合严格格式
    pub fn parse(&self, product: &str) -> Option<LotParts> {
        let mut tail = self.0.rsplitn(3, '-');
        let seq_part = tail.next()?;
        let week_part = tail.next()?;
        let head = tail.next()?;

        if seq_part.len() < 3 || !seq_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let seq = seq_part.parse::<u32>().ok()?;

        let (year_str, week_str) = week_part.split_once('W')?;
        if year_str.len() != 4 || week_str.len() != 2 {
            return None;
        }
        let iso_year = year_str.parse::<i32>().ok()?;
        let iso_week = week_str.parse::<u32>().ok()?;
        if !(1..=53).contains(&iso_week) {
            return None;
        }

        let suffix = format!("-{}", product);
        let node = head.strip_suffix(&suffix)?;
        if node.is_empty() || product.is_empty() {
            return None;
        }

        Some(LotParts {
            node: node.to_string(),
            product: product.to_string(),
            iso_year,
            iso_week,
            seq,
        })
    }

    /// 宽松格式: 非空且不含空白字符
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LotId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_zero_pads_fields() {
        let lot = LotId::compose("CS_JPN", "RICE", 2024, 5, 7);
        assert_eq!(lot.as_str(), "CS_JPN-RICE-2024W05-007");
    }

    #[test]
    fn test_parse_handles_dashes_in_node_name() {
        let lot = LotId::compose("DAD-TOKYO", "RICE", 2025, 12, 1);
        let parts = lot.parse("RICE").unwrap();
        assert_eq!(parts.node, "DAD-TOKYO");
        assert_eq!(parts.iso_year, 2025);
        assert_eq!(parts.iso_week, 12);
        assert_eq!(parts.seq, 1);
    }

    #[test]
    fn test_parse_rejects_wrong_product_or_shape() {
        let lot = LotId::compose("A", "RICE", 2025, 12, 1);
        assert!(lot.parse("WHEAT").is_none());
        assert!(LotId::new("A-RICE-2025W60-001").parse("RICE").is_none());
        assert!(LotId::new("A-RICE-25W12-001").parse("RICE").is_none());
        assert!(LotId::new("lot1").parse("RICE").is_none());
    }

    #[test]
    fn test_lenient_format() {
        assert!(LotId::new("x").is_well_formed());
        assert!(!LotId::new("").is_well_formed());
        assert!(!LotId::new("a b").is_well_formed());
    }
}

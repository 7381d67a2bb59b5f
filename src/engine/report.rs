// ==========================================
// PSI 供需平衡引擎 - 运行报告
// ==========================================
// 职责: 汇总可恢复异常与校验结果
// 红线: 单节点异常只记录不中断,整棵树照常推演
// ==========================================

use crate::domain::types::{Bucket, Layer};
use crate::validation::ValidationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Anomaly - 可恢复异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Anomaly {
    /// S 中批次在 I[w-1] ∪ P[w] 中找不到
    UnderSupply {
        node: String,
        layer: Layer,
        week: usize,
        lot: String,
    },
    /// 平移越出规划期,批次被钳制在边界周
    RangeOverflow {
        node: String,
        layer: Layer,
        bucket: Bucket,
        source_week: usize,
        target_week: usize,
        lot: String,
    },
    /// 同一 (节点, 桶, 周) 重复插入,已忽略
    DuplicateLot {
        node: String,
        layer: Layer,
        bucket: Bucket,
        week: usize,
        lot: String,
    },
    /// 产能不足,批次留在需求周
    CapacityShortfall {
        node: String,
        week: usize,
        lot: String,
    },
    /// 规划期收缩导致批次被丢弃
    Truncated {
        node: String,
        layer: Layer,
        lots: usize,
    },
}

impl Anomaly {
    pub fn node(&self) -> &str {
        match self {
            Anomaly::UnderSupply { node, .. }
            | Anomaly::RangeOverflow { node, .. }
            | Anomaly::DuplicateLot { node, .. }
            | Anomaly::CapacityShortfall { node, .. }
            | Anomaly::Truncated { node, .. } => node,
        }
    }
}

/// 各类异常计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyTotals {
    pub under_supply: usize,
    pub range_overflow: usize,
    pub duplicate_lot: usize,
    pub capacity_shortfall: usize,
    pub truncated_lots: usize,
}

impl AnomalyTotals {
    pub fn from_anomalies(anomalies: &[Anomaly]) -> Self {
        let mut totals = Self::default();
        for anomaly in anomalies {
            match anomaly {
                Anomaly::UnderSupply { .. } => totals.under_supply += 1,
                Anomaly::RangeOverflow { .. } => totals.range_overflow += 1,
                Anomaly::DuplicateLot { .. } => totals.duplicate_lot += 1,
                Anomaly::CapacityShortfall { .. } => totals.capacity_shortfall += 1,
                Anomaly::Truncated { lots, .. } => totals.truncated_lots += lots,
            }
        }
        totals
    }
}

// ==========================================
// RunReport - 单产品运行报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// 运行 ID
    pub run_id: String,

    /// 产品
    pub product: String,

    /// 生成时间
    pub generated_at: DateTime<Utc>,

    /// 规划期长度
    pub horizon_weeks: usize,

    /// 节点数
    pub node_count: usize,

    /// 调达侧节点数 (含与出荷侧共用的根节点;无调达树时为 0)
    #[serde(default)]
    pub inbound_node_count: usize,

    /// 实际使用的解耦节点
    pub decouple_nodes: Vec<String>,

    /// 配置快照 (JSON)
    pub config_snapshot: String,

    /// 异常计数
    pub totals: AnomalyTotals,

    /// 异常明细
    pub anomalies: Vec<Anomaly>,

    /// 校验结果
    pub validation: ValidationReport,
}

impl RunReport {
    pub fn new(product: &str, horizon_weeks: usize, node_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            product: product.to_string(),
            generated_at: Utc::now(),
            horizon_weeks,
            node_count,
            inbound_node_count: 0,
            decouple_nodes: Vec::new(),
            config_snapshot: "{}".to_string(),
            totals: AnomalyTotals::default(),
            anomalies: Vec::new(),
            validation: ValidationReport::default(),
        }
    }

    pub fn record(&mut self, anomalies: Vec<Anomaly>) {
        self.anomalies.extend(anomalies);
        self.totals = AnomalyTotals::from_anomalies(&self.anomalies);
    }

    /// 某节点的异常
    pub fn anomalies_for<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Anomaly> + 'a {
        self.anomalies.iter().filter(move |a| a.node() == node)
    }

    /// 单行摘要
    pub fn summary_line(&self) -> String {
        format!(
            "product={} weeks={} nodes={} lots={} under_supply={} overflow={} duplicates={} shortfall={} findings={}",
            self.product,
            self.horizon_weeks,
            self.node_count,
            self.validation.total_lots,
            self.totals.under_supply,
            self.totals.range_overflow,
            self.validation.duplicate_lots,
            self.totals.capacity_shortfall,
            self.validation.findings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_follow_recorded_anomalies() {
        let mut report = RunReport::new("RICE", 10, 3);
        report.record(vec![
            Anomaly::UnderSupply {
                node: "a".into(),
                layer: Layer::Supply,
                week: 2,
                lot: "x".into(),
            },
            Anomaly::Truncated {
                node: "b".into(),
                layer: Layer::Demand,
                lots: 4,
            },
        ]);
        assert_eq!(report.totals.under_supply, 1);
        assert_eq!(report.totals.truncated_lots, 4);
        assert_eq!(report.anomalies_for("a").count(), 1);
        assert!(Uuid::parse_str(&report.run_id).is_ok());
    }

    #[test]
    fn test_anomaly_serializes_with_kind_tag() {
        let a = Anomaly::CapacityShortfall {
            node: "f".into(),
            week: 1,
            lot: "l".into(),
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["kind"], "CAPACITY_SHORTFALL");
        assert_eq!(json["node"], "f");
    }
}

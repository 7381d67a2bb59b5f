// ==========================================
// PSI 供需平衡引擎 - 库存平衡递推 (PS -> I)
// ==========================================
// 职责: 调用缓冲区递推并把欠供转换为异常记录
// 红线: 欠供只记录不中断;各节点独立,无顺序约束
// ==========================================

use crate::domain::node::PlanNode;
use crate::domain::types::Layer;
use crate::engine::report::Anomaly;
use crate::perf;
use tracing::warn;

pub struct BalanceEngine {
    // 无状态引擎
}

impl BalanceEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 重算节点某层的 I
    ///
    /// # 返回
    /// 欠供异常 (周升序)
    pub fn balance(&self, node: &mut PlanNode, layer: Layer) -> Vec<Anomaly> {
        let shortages = node.psi_mut(layer).balance();
        if shortages.is_empty() {
            return Vec::new();
        }

        warn!(
            node = %node.name,
            layer = %layer,
            shortages = shortages.len(),
            first_week = shortages[0].week,
            "出荷批次无可用库存 (欠供)"
        );
        perf::record_anomalies(shortages.len());

        shortages
            .into_iter()
            .map(|s| Anomaly::UnderSupply {
                node: node.name.clone(),
                layer,
                week: s.week,
                lot: s.lot.to_string(),
            })
            .collect()
    }
}

impl Default for BalanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

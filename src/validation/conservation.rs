// ==========================================
// PSI 供需平衡引擎 - 批次守恒校验
// ==========================================
// 职责: 全期批次数守恒
// 1) 汇总点: Σ 子节点 P == 父节点 S (需求层全部非叶子;供给层拉式/解耦非叶子)
// 2) 往返: 节点 S 数 == P 数 (解耦/推式节点的供给 P 对应需求层 S)
// 说明: 越界批次保留在边界周,仍计入数量;越界数单独报告
// ==========================================

use crate::domain::node::NodeId;
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer, NodeSide};
use crate::validation::report::{FindingKind, ValidationFinding};

pub struct ConservationValidator {
    tolerance: usize,
}

impl ConservationValidator {
    pub fn new(tolerance: usize) -> Self {
        Self { tolerance }
    }

    /// # 参数
    /// - `sides`: 供给层节点分区 (按 NodeId 下标);为空时只校验需求层
    pub fn check(&self, tree: &SupplyTree, sides: &[NodeSide]) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        for id in tree.preorder() {
            // ===== 需求层 =====
            self.check_aggregation(tree, id, Layer::Demand, &mut findings);
            let node = tree.node(id);
            self.compare(
                &mut findings,
                FindingKind::RoundTrip,
                &node.name,
                Layer::Demand,
                node.psi(Layer::Demand).bucket_len(Bucket::Ship),
                node.psi(Layer::Demand).bucket_len(Bucket::Arrival),
                "S 批次数与 P 批次数不一致",
            );

            // ===== 供给层 =====
            let Some(side) = sides.get(id).copied() else {
                continue;
            };
            if matches!(side, NodeSide::Pull | NodeSide::Decouple) {
                self.check_aggregation(tree, id, Layer::Supply, &mut findings);
            }
            let expected = match side {
                NodeSide::Pull => node.psi(Layer::Supply).bucket_len(Bucket::Ship),
                NodeSide::Decouple | NodeSide::Push => node.psi(Layer::Demand).bucket_len(Bucket::Ship),
            };
            self.compare(
                &mut findings,
                FindingKind::RoundTrip,
                &node.name,
                Layer::Supply,
                expected,
                node.psi(Layer::Supply).bucket_len(Bucket::Arrival),
                "供给层 P 批次数与来源 S 批次数不一致",
            );
        }
        findings
    }

    fn check_aggregation(&self, tree: &SupplyTree, id: NodeId, layer: Layer, findings: &mut Vec<ValidationFinding>) {
        let node = tree.node(id);
        if node.is_leaf() {
            return;
        }
        let children_p: usize = node
            .children
            .iter()
            .map(|c| tree.node(*c).psi(layer).bucket_len(Bucket::Arrival))
            .sum();
        self.compare(
            findings,
            FindingKind::Conservation,
            &node.name,
            layer,
            children_p,
            node.psi(layer).bucket_len(Bucket::Ship),
            "子节点 P 合计与父节点 S 不一致",
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn compare(
        &self,
        findings: &mut Vec<ValidationFinding>,
        kind: FindingKind,
        node: &str,
        layer: Layer,
        expected: usize,
        actual: usize,
        message: &str,
    ) {
        if expected.abs_diff(actual) > self.tolerance {
            findings.push(ValidationFinding {
                kind,
                node: node.to_string(),
                layer: Some(layer),
                expected,
                actual,
                message: message.to_string(),
            });
        }
    }
}

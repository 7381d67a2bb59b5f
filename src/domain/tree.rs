// ==========================================
// PSI 供需平衡引擎 - 供应链树 (arena)
// ==========================================
// 职责: 单产品节点树的构建与遍历
// 输入: 树定义行 (父子边)
// 红线: 恰好一个根;每个节点至多一个父节点;无环
// ==========================================

use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::lot::LotId;
use crate::domain::node::{NodeId, PlanNode};
use crate::domain::records::TreeRow;
use crate::domain::types::Layer;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

// ==========================================
// SupplyTree - 单产品供应链树
// ==========================================
#[derive(Debug, Clone)]
pub struct SupplyTree {
    product: String,
    nodes: Vec<PlanNode>,
    root: NodeId,
    index: HashMap<String, NodeId>,
}

/// 截断记录: (节点, 层, 被丢弃批次)
pub type Truncation = (NodeId, Layer, Vec<LotId>);

impl SupplyTree {
    // ==========================================
    // 构建
    // ==========================================

    /// 按产品分组构建森林
    pub fn build_forest(rows: &[TreeRow]) -> PlanningResult<BTreeMap<String, SupplyTree>> {
        let mut grouped: BTreeMap<String, Vec<TreeRow>> = BTreeMap::new();
        for row in rows {
            grouped
                .entry(row.product_name.clone())
                .or_default()
                .push(row.clone());
        }

        let mut forest = BTreeMap::new();
        for (product, product_rows) in grouped {
            let tree = Self::build(&product, &product_rows)?;
            forest.insert(product, tree);
        }
        Ok(forest)
    }

    /// 构建单产品树
    ///
    /// # 参数
    /// - `product`: 产品名 (其他产品的行会被忽略)
    /// - `rows`: 树定义行
    ///
    /// # 返回
    /// - `Err(NegativeLeadTime / NegativeSafetyStock)`: 属性为负
    /// - `Err(DuplicateParent)`: 节点出现在多条父子边的子端
    /// - `Err(NoRoot / MultipleRoots)`: 根节点不唯一
    /// - `Err(UnreachableNodes)`: 存在环
    pub fn build(product: &str, rows: &[TreeRow]) -> PlanningResult<Self> {
        let mut tree = SupplyTree {
            product: product.to_string(),
            nodes: Vec::new(),
            root: 0,
            index: HashMap::new(),
        };

        let mut has_parent: Vec<bool> = Vec::new();
        for row in rows.iter().filter(|r| r.product_name == product) {
            let lead_time = u32::try_from(row.lead_time_weeks).map_err(|_| {
                PlanningError::NegativeLeadTime {
                    node: row.child_name.clone(),
                    value: row.lead_time_weeks,
                }
            })?;
            let safety_stock = u32::try_from(row.safety_stock_days).map_err(|_| {
                PlanningError::NegativeSafetyStock {
                    node: row.child_name.clone(),
                    value: row.safety_stock_days,
                }
            })?;

            let child = tree.intern(&row.child_name, &mut has_parent);
            {
                let node = &mut tree.nodes[child];
                node.lead_time_weeks = lead_time;
                node.safety_stock_days = safety_stock;
                node.lot_size = row.lot_size.max(1);
            }

            // 根节点属性行
            if row.parent_name.is_empty() {
                continue;
            }

            if has_parent[child] {
                return Err(PlanningError::DuplicateParent {
                    product: product.to_string(),
                    node: row.child_name.clone(),
                });
            }
            let parent = tree.intern(&row.parent_name, &mut has_parent);
            has_parent[child] = true;
            tree.nodes[child].parent = Some(parent);
            tree.nodes[parent].children.push(child);
        }

        let roots: Vec<NodeId> = (0..tree.nodes.len()).filter(|id| !has_parent[*id]).collect();
        tree.root = match roots.as_slice() {
            [] => {
                return Err(PlanningError::NoRoot {
                    product: product.to_string(),
                })
            }
            [root] => *root,
            _ => {
                return Err(PlanningError::MultipleRoots {
                    product: product.to_string(),
                    candidates: roots.iter().map(|id| tree.nodes[*id].name.clone()).collect(),
                })
            }
        };

        // 环检测: 从根出发不可达的节点
        let reachable = tree.preorder();
        if reachable.len() != tree.nodes.len() {
            let mut seen = vec![false; tree.nodes.len()];
            for id in &reachable {
                seen[*id] = true;
            }
            let nodes = (0..tree.nodes.len())
                .filter(|id| !seen[*id])
                .map(|id| tree.nodes[id].name.clone())
                .collect();
            return Err(PlanningError::UnreachableNodes {
                product: product.to_string(),
                nodes,
            });
        }

        debug!(
            product = %product,
            nodes = tree.nodes.len(),
            root = %tree.nodes[tree.root].name,
            "供应链树构建完成"
        );
        Ok(tree)
    }

    fn intern(&mut self, name: &str, has_parent: &mut Vec<bool>) -> NodeId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = self.nodes.len();
        self.nodes.push(PlanNode::new(name, 0, 0, 1));
        self.index.insert(name.to_string(), id);
        has_parent.push(false);
        id
    }

    // ==========================================
    // 访问
    // ==========================================

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PlanNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PlanNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// 按名称查找,找不到返回配置错误
    pub fn node_id(&self, name: &str) -> PlanningResult<NodeId> {
        self.find(name).ok_or_else(|| PlanningError::UnknownNode {
            product: self.product.clone(),
            node: name.to_string(),
        })
    }

    /// 规划期长度 (以根节点缓冲区为准)
    pub fn horizon(&self) -> usize {
        self.nodes[self.root].horizon()
    }

    /// 全树按规划期分配缓冲区
    pub fn allocate(&mut self, horizon: usize) -> Vec<Truncation> {
        let mut truncated = Vec::new();
        for (id, node) in self.nodes.iter_mut().enumerate() {
            for (layer, lots) in node.allocate(horizon) {
                truncated.push((id, layer, lots));
            }
        }
        truncated
    }

    // ==========================================
    // 遍历
    // ==========================================

    /// 先序: 父先于子,子按定义顺序
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            for child in self.nodes[id].children.iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    /// 后序: 子先于父
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.nodes[id].children.iter().rev() {
                stack.push((*child, false));
            }
        }
        order
    }

    /// 祖先链 (父 -> 根)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.nodes[parent].parent;
        }
        chain
    }

    /// 高度: 叶子为 0
    pub fn height(&self, id: NodeId) -> usize {
        self.nodes[id]
            .children
            .iter()
            .map(|c| self.height(*c) + 1)
            .max()
            .unwrap_or(0)
    }

    /// 叶子 (先序)
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[*id].is_leaf())
            .collect()
    }
}

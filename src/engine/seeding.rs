// ==========================================
// PSI 供需平衡引擎 - 初始化播种
// ==========================================
// 职责: 把外部输入行写入树的初始状态
// 输入: 需求行 / 确认出荷行 / 休假周 / 生产模板
// 输出: 叶子 S (需求层 + 镜像到供给层) / 节点休假周 / 周产能表
// 红线: 需求只能落在叶子节点
// 红线: 需求层 S 镜像到供给层 S 是唯一允许的同批次双占用
// ==========================================

use crate::domain::calendar::CalendarIndex;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::lot::LotId;
use crate::domain::node::NodeId;
use crate::domain::psi::InsertOutcome;
use crate::domain::records::{ConfirmedShipmentRow, DemandRow, TemplateRow, VacationRow};
use crate::domain::tree::SupplyTree;
use crate::domain::types::{Bucket, Layer};
use crate::engine::leveling::WeeklyCapacity;
use crate::engine::report::Anomaly;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// 节点 -> 周产能
pub type TemplateBook = BTreeMap<NodeId, WeeklyCapacity>;

/// 播种结果
#[derive(Debug, Clone, Default)]
pub struct SeedResult {
    pub seeded: usize,
    pub anomalies: Vec<Anomaly>,
}

// ==========================================
// PsiSeeder - 初始化播种
// ==========================================
pub struct PsiSeeder {
    // 无状态引擎
}

impl PsiSeeder {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 写入节点休假周
    ///
    /// 超出规划期的周索引被忽略并告警
    pub fn apply_vacations(&self, tree: &mut SupplyTree, rows: &[VacationRow]) -> PlanningResult<usize> {
        let horizon = tree.horizon();
        let mut applied = 0;
        let product = tree.product().to_string();
        for row in rows.iter().filter(|r| r.product == product) {
            let id = tree.node_id(&row.node)?;
            let (valid, invalid): (Vec<usize>, Vec<usize>) =
                row.week_indices.iter().copied().partition(|w| *w < horizon);
            if !invalid.is_empty() {
                warn!(
                    node = %row.node,
                    ignored = ?invalid,
                    horizon = horizon,
                    "休假周超出规划期,已忽略"
                );
            }
            applied += valid.len();
            tree.node_mut(id).add_vacation_weeks(valid);
        }
        Ok(applied)
    }

    /// 播种叶子需求 (需求层 S,并镜像到供给层 S)
    ///
    /// 批次来源优先级: lot_ids > lot_count > quantity / lot_size (向上取整)
    ///
    /// # 返回
    /// - `Err(UnknownNode / DemandOnInteriorNode / MissingCalendarEntry)`
    pub fn seed_demand(
        &self,
        tree: &mut SupplyTree,
        calendar: &CalendarIndex,
        rows: &[DemandRow],
    ) -> PlanningResult<SeedResult> {
        let product = tree.product().to_string();
        let mut result = SeedResult::default();
        // (节点, 周) -> 已生成序号,同周多行时续号
        let mut next_seq: HashMap<(NodeId, usize), u32> = HashMap::new();

        for row in rows.iter().filter(|r| r.product == product) {
            let id = self.leaf_id(tree, &row.node)?;
            let week = calendar.week_of(row.iso_year, row.iso_week)?;

            let lots: Vec<LotId> = if !row.lot_ids.is_empty() {
                row.lot_ids.iter().map(|s| LotId::new(s.as_str())).collect()
            } else {
                let count = match (row.lot_count, row.quantity) {
                    (Some(n), _) => n,
                    (None, Some(q)) => {
                        let size = u64::from(tree.node(id).lot_size.max(1));
                        u32::try_from(q.div_ceil(size)).map_err(|_| PlanningError::FieldValueError {
                            field: "quantity".to_string(),
                            message: format!("需求量过大: node={}, quantity={}", row.node, q),
                        })?
                    }
                    (None, None) => 0,
                };
                let seq = next_seq.entry((id, week)).or_insert(0);
                (0..count)
                    .map(|_| {
                        *seq += 1;
                        LotId::compose(&row.node, &product, row.iso_year, row.iso_week, *seq)
                    })
                    .collect()
            };

            let node = tree.node_mut(id);
            for lot in lots {
                for layer in Layer::ALL {
                    match node.psi_mut(layer).insert(week, Bucket::Ship, lot.clone()) {
                        InsertOutcome::Inserted => {
                            if layer == Layer::Demand {
                                result.seeded += 1;
                            }
                        }
                        InsertOutcome::Duplicate => result.anomalies.push(Anomaly::DuplicateLot {
                            node: node.name.clone(),
                            layer,
                            bucket: Bucket::Ship,
                            week,
                            lot: lot.to_string(),
                        }),
                        InsertOutcome::OutOfRange => {
                            return Err(PlanningError::WeekOutOfHorizon {
                                week_index: week,
                                horizon: node.horizon(),
                            })
                        }
                    }
                }
            }
        }

        info!(
            product = %product,
            seeded = result.seeded,
            duplicates = result.anomalies.len(),
            "叶子需求播种完成"
        );
        Ok(result)
    }

    /// 用确认出荷替换叶子供给层 S (实际 S 回馈)
    ///
    /// 出现在确认行中的节点,其供给层 S 全期清空后重建;未出现的节点保留镜像的预测 S
    pub fn apply_confirmed(
        &self,
        tree: &mut SupplyTree,
        calendar: &CalendarIndex,
        rows: &[ConfirmedShipmentRow],
    ) -> PlanningResult<SeedResult> {
        let product = tree.product().to_string();
        let mut grouped: BTreeMap<NodeId, Vec<(usize, &ConfirmedShipmentRow)>> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.product == product) {
            let id = self.leaf_id(tree, &row.node)?;
            let week = calendar.week_of(row.iso_year, row.iso_week)?;
            grouped.entry(id).or_default().push((week, row));
        }

        let mut result = SeedResult::default();
        for (id, entries) in grouped {
            let node = tree.node_mut(id);
            let buffer = node.psi_mut(Layer::Supply);
            buffer.clear_bucket(Bucket::Ship);
            for (week, row) in entries {
                for lot in &row.lot_ids {
                    match buffer.insert(week, Bucket::Ship, LotId::new(lot.as_str())) {
                        InsertOutcome::Inserted => result.seeded += 1,
                        InsertOutcome::Duplicate => result.anomalies.push(Anomaly::DuplicateLot {
                            node: row.node.clone(),
                            layer: Layer::Supply,
                            bucket: Bucket::Ship,
                            week,
                            lot: lot.clone(),
                        }),
                        InsertOutcome::OutOfRange => {
                            return Err(PlanningError::WeekOutOfHorizon {
                                week_index: week,
                                horizon: buffer.horizon(),
                            })
                        }
                    }
                }
            }
            debug!(node = %node.name, "确认出荷已替换供给层 S");
        }
        Ok(result)
    }

    /// 生产模板 -> 节点周产能
    ///
    /// 没有模板行的周产能为 0;同周多行累加
    pub fn seed_templates(
        &self,
        tree: &SupplyTree,
        calendar: &CalendarIndex,
        rows: &[TemplateRow],
    ) -> PlanningResult<TemplateBook> {
        let horizon = tree.horizon();
        let mut limits: BTreeMap<NodeId, Vec<u32>> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.product == tree.product()) {
            let id = tree.node_id(&row.node)?;
            let week = calendar.week_of(row.iso_year, row.iso_week)?;
            let caps = limits.entry(id).or_insert_with(|| vec![0; horizon]);
            if let Some(cap) = caps.get_mut(week) {
                *cap = cap.saturating_add(row.capacity_lot_count);
            }
        }
        Ok(limits
            .into_iter()
            .map(|(id, caps)| (id, WeeklyCapacity::new(caps)))
            .collect())
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn leaf_id(&self, tree: &SupplyTree, name: &str) -> PlanningResult<NodeId> {
        let id = tree.node_id(name)?;
        if !tree.node(id).is_leaf() {
            return Err(PlanningError::DemandOnInteriorNode {
                product: tree.product().to_string(),
                node: name.to_string(),
            });
        }
        Ok(id)
    }
}

impl Default for PsiSeeder {
    fn default() -> Self {
        Self::new()
    }
}

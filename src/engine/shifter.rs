// ==========================================
// PSI 供需平衡引擎 - 批次平移器
// ==========================================
// 职责: 将源桶各周批次按提前期平移到目标周,再写入目标桶
// 输入: 源桶 (周 -> 批次) + 平移能力 + offset/方向
// 输出: LotMove 列表;写入时产出越界/重复异常
// 红线: 先算完全部移动再写入,写入顺序 = 源周升序 + 周内原顺序
// ==========================================

use crate::domain::lot::LotId;
use crate::domain::node::LeadTimeShift;
use crate::domain::psi::{InsertOutcome, PsiBuffer};
use crate::domain::types::{Bucket, Layer, ShiftDirection};
use crate::engine::report::Anomaly;
use crate::perf;
use tracing::debug;

/// 单个批次的平移计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotMove {
    pub source_week: usize,
    pub target_week: usize,
    pub lot: LotId,
    pub overflow: bool,
}

// ==========================================
// LotShifter - 批次平移器
// ==========================================
pub struct LotShifter {
    // 无状态引擎
}

impl LotShifter {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算平移计划
    ///
    /// # 参数
    /// - `shift`: 决定休假周的节点
    /// - `source`: 源桶 (周, 批次) 序列,按周升序
    /// - `offset`: 开放周数
    /// - `direction`: 平移方向
    /// - `horizon`: 规划期长度
    pub fn plan_moves<'a, S, I>(
        &self,
        shift: &S,
        source: I,
        offset: u32,
        direction: ShiftDirection,
        horizon: usize,
    ) -> Vec<LotMove>
    where
        S: LeadTimeShift + ?Sized,
        I: IntoIterator<Item = (usize, &'a [LotId])>,
    {
        let mut moves = Vec::new();
        for (week, lots) in source {
            if lots.is_empty() {
                continue;
            }
            let outcome = shift.shift(week, offset, direction, horizon);
            for lot in lots {
                moves.push(LotMove {
                    source_week: week,
                    target_week: outcome.week,
                    lot: lot.clone(),
                    overflow: outcome.overflow,
                });
            }
        }
        moves
    }

    /// 不平移,原周复制 (offset = 0 的 S -> P)
    pub fn identity_moves<'a, I>(&self, source: I) -> Vec<LotMove>
    where
        I: IntoIterator<Item = (usize, &'a [LotId])>,
    {
        source
            .into_iter()
            .flat_map(|(week, lots)| {
                lots.iter().map(move |lot| LotMove {
                    source_week: week,
                    target_week: week,
                    lot: lot.clone(),
                    overflow: false,
                })
            })
            .collect()
    }

    /// 将平移计划写入目标桶
    ///
    /// # 返回
    /// (写入批次数, 异常列表)
    pub fn apply_moves(
        &self,
        target: &mut PsiBuffer,
        bucket: Bucket,
        moves: Vec<LotMove>,
        node_name: &str,
        layer: Layer,
    ) -> (usize, Vec<Anomaly>) {
        let mut inserted = 0;
        let mut anomalies = Vec::new();

        for mv in moves {
            if mv.overflow {
                anomalies.push(Anomaly::RangeOverflow {
                    node: node_name.to_string(),
                    layer,
                    bucket,
                    source_week: mv.source_week,
                    target_week: mv.target_week,
                    lot: mv.lot.to_string(),
                });
            }
            let lot_name = mv.lot.to_string();
            match target.insert(mv.target_week, bucket, mv.lot) {
                InsertOutcome::Inserted => inserted += 1,
                InsertOutcome::Duplicate => {
                    debug!(
                        node = %node_name,
                        layer = %layer,
                        bucket = %bucket,
                        week = mv.target_week,
                        lot = %lot_name,
                        "重复批次,忽略"
                    );
                    anomalies.push(Anomaly::DuplicateLot {
                        node: node_name.to_string(),
                        layer,
                        bucket,
                        week: mv.target_week,
                        lot: lot_name,
                    });
                }
                // 平移结果总在 [0, W) 内,只有缓冲区未分配时才会走到这里
                InsertOutcome::OutOfRange => anomalies.push(Anomaly::RangeOverflow {
                    node: node_name.to_string(),
                    layer,
                    bucket,
                    source_week: mv.source_week,
                    target_week: mv.target_week,
                    lot: lot_name,
                }),
            }
        }

        perf::record_lot_moves(inserted);
        perf::record_anomalies(anomalies.len());
        (inserted, anomalies)
    }
}

impl Default for LotShifter {
    fn default() -> Self {
        Self::new()
    }
}

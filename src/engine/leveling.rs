// ==========================================
// PSI 供需平衡引擎 - 产能平准化
// ==========================================
// 职责: 按生产模板周产能重新排布节点 P
// 输入: 已推导的 P (需求周) + 周产能
// 输出: 平准化后的 P + 产能不足异常
// 规则:
// 1) 按需求周升序逐批次处理
// 2) 优先放到 <= 需求周的最近一个有余量的周 (提前生产)
// 3) 否则放到 > 需求周的最早有余量的周 (延迟)
// 4) 都没有则留在需求周并记录 CapacityShortfall
// ==========================================

use crate::domain::node::{LeadTimeShift, PlanNode};
use crate::domain::types::{Bucket, Layer};
use crate::engine::report::Anomaly;
use crate::perf;
use tracing::{info, instrument};

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: 平准化时的周产能检查接口
pub trait CapacityConstraint {
    /// 检查该周是否还能再排一个批次
    fn can_add_lot(&self, week: usize) -> bool;

    /// 占用该周一个批次的产能
    fn consume(&mut self, week: usize);

    /// 该周剩余产能
    fn remaining_lots(&self, week: usize) -> u32;
}

// ==========================================
// WeeklyCapacity - 节点周产能
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyCapacity {
    limit: Vec<u32>,
    used: Vec<u32>,
}

impl WeeklyCapacity {
    /// 由逐周产能构建 (缺失周按 0 处理)
    pub fn new(limit: Vec<u32>) -> Self {
        let used = vec![0; limit.len()];
        Self { limit, used }
    }

    /// 休假周不可生产
    pub fn block_vacations<S: LeadTimeShift + ?Sized>(&mut self, node: &S) {
        for (week, cap) in self.limit.iter_mut().enumerate() {
            if node.is_blocked(week) {
                *cap = 0;
            }
        }
    }
}

impl CapacityConstraint for WeeklyCapacity {
    fn can_add_lot(&self, week: usize) -> bool {
        self.remaining_lots(week) > 0
    }

    fn consume(&mut self, week: usize) {
        if let Some(used) = self.used.get_mut(week) {
            *used = used.saturating_add(1);
        }
    }

    fn remaining_lots(&self, week: usize) -> u32 {
        match (self.limit.get(week), self.used.get(week)) {
            (Some(limit), Some(used)) => limit.saturating_sub(*used),
            _ => 0,
        }
    }
}

// ==========================================
// CapacityLeveler - 产能平准化引擎
// ==========================================
pub struct CapacityLeveler {
    // 无状态引擎
}

/// 平准化结果
#[derive(Debug, Clone, Default)]
pub struct LevelingResult {
    pub built_ahead: usize,
    pub delayed: usize,
    pub anomalies: Vec<Anomaly>,
}

impl CapacityLeveler {
    pub fn new() -> Self {
        Self {}
    }

    /// 平准化节点某层的 P
    ///
    /// # 参数
    /// - `node`: 节点 (P 会被重排)
    /// - `layer`: 层
    /// - `capacity`: 周产能 (按副本使用,调用方的模板不被消耗)
    #[instrument(skip(self, node, capacity), fields(node = %node.name, layer = %layer))]
    pub fn level(&self, node: &mut PlanNode, layer: Layer, capacity: &WeeklyCapacity) -> LevelingResult {
        let mut pool = capacity.clone();
        pool.block_vacations(&*node);

        let name = node.name.clone();
        let buffer = node.psi_mut(layer);
        let horizon = buffer.horizon();
        let required = buffer.take_bucket(Bucket::Arrival);

        let mut result = LevelingResult::default();
        for (required_week, lots) in required.into_iter().enumerate() {
            for lot in lots {
                let ahead = (0..=required_week).rev().find(|w| pool.can_add_lot(*w));
                let placed = match ahead {
                    Some(w) => {
                        if w < required_week {
                            result.built_ahead += 1;
                        }
                        Some(w)
                    }
                    None => {
                        let late = (required_week + 1..horizon).find(|w| pool.can_add_lot(*w));
                        if late.is_some() {
                            result.delayed += 1;
                        }
                        late
                    }
                };

                let week = match placed {
                    Some(w) => {
                        pool.consume(w);
                        w
                    }
                    None => {
                        result.anomalies.push(Anomaly::CapacityShortfall {
                            node: name.clone(),
                            week: required_week,
                            lot: lot.to_string(),
                        });
                        required_week
                    }
                };
                buffer.insert(week, Bucket::Arrival, lot);
            }
        }

        perf::record_anomalies(result.anomalies.len());
        info!(
            node = %name,
            built_ahead = result.built_ahead,
            delayed = result.delayed,
            shortfall = result.anomalies.len(),
            "产能平准化完成"
        );
        result
    }
}

impl Default for CapacityLeveler {
    fn default() -> Self {
        Self::new()
    }
}

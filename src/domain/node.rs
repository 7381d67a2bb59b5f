// ==========================================
// PSI 供需平衡引擎 - 供应链节点
// ==========================================
// 职责: 节点属性 + 双层 PSI 缓冲区 + 提前期平移能力
// 红线: 节点只持有子节点索引;父节点为非拥有索引
// ==========================================

use crate::domain::lot::LotId;
use crate::domain::psi::PsiBuffer;
use crate::domain::types::{Layer, ShiftDirection};
use std::collections::BTreeSet;
use tracing::warn;

/// 节点句柄: 树内 arena 下标
pub type NodeId = usize;

// ==========================================
// Trait: LeadTimeShift
// ==========================================
// 用途: 提前期/休假周平移,按节点类型实现一次

/// 平移结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftOutcome {
    pub week: usize,
    /// 走出 [0, W) 被钳制在边界
    pub overflow: bool,
}

pub trait LeadTimeShift {
    /// 该周是否不可收发
    fn is_blocked(&self, week: usize) -> bool;

    /// 从 `week` 沿 `direction` 走 `offset` 个开放周
    ///
    /// 规则:
    /// 1) 休假周不消耗 offset
    /// 2) offset = 0 且起点为休假周时,继续走到下一个开放周
    /// 3) 走出 [0, horizon) 时钳制到边界并标记 overflow
    ///
    /// 对固定 offset / direction 单调: 起点越大结果不越小
    fn shift(
        &self,
        week: usize,
        offset: u32,
        direction: ShiftDirection,
        horizon: usize,
    ) -> ShiftOutcome {
        if horizon == 0 {
            return ShiftOutcome { week: 0, overflow: true };
        }
        let last = (horizon - 1) as isize;
        let boundary = match direction {
            ShiftDirection::Forward => horizon - 1,
            ShiftDirection::Backward => 0,
        };
        if week as isize > last {
            return ShiftOutcome { week: horizon - 1, overflow: true };
        }

        let step = direction.step();
        let mut pos = week as isize;
        let mut remaining = offset;
        loop {
            if remaining == 0 && !self.is_blocked(pos as usize) {
                return ShiftOutcome { week: pos as usize, overflow: false };
            }
            let next = pos + step;
            if next < 0 || next > last {
                return ShiftOutcome { week: boundary, overflow: true };
            }
            pos = next;
            if remaining > 0 && !self.is_blocked(pos as usize) {
                remaining -= 1;
            }
        }
    }
}

// ==========================================
// PlanNode - 供应链节点
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanNode {
    // ===== 属性 =====
    pub name: String,
    pub lead_time_weeks: u32,
    pub safety_stock_days: u32,
    pub lot_size: u32,

    // ===== 树结构 =====
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    // ===== 状态 =====
    vacation_weeks: BTreeSet<usize>,
    demand: PsiBuffer,
    supply: PsiBuffer,
}

impl PlanNode {
    pub fn new(name: impl Into<String>, lead_time_weeks: u32, safety_stock_days: u32, lot_size: u32) -> Self {
        Self {
            name: name.into(),
            lead_time_weeks,
            safety_stock_days,
            lot_size: lot_size.max(1),
            parent: None,
            children: Vec::new(),
            vacation_weeks: BTreeSet::new(),
            demand: PsiBuffer::default(),
            supply: PsiBuffer::default(),
        }
    }

    /// 安全库存天数折算为整周 (四舍五入, 4 天及以上进位)
    pub fn safety_stock_weeks(&self) -> u32 {
        let days = self.safety_stock_days;
        days / 7 + u32::from(days % 7 >= 4)
    }

    /// S -> P 总偏移: 安全库存周 + 提前期
    pub fn demand_offset(&self) -> u32 {
        self.safety_stock_weeks() + self.lead_time_weeks
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    // ===== 休假周 =====

    pub fn set_vacation_weeks<I: IntoIterator<Item = usize>>(&mut self, weeks: I) {
        self.vacation_weeks = weeks.into_iter().collect();
    }

    pub fn add_vacation_weeks<I: IntoIterator<Item = usize>>(&mut self, weeks: I) {
        self.vacation_weeks.extend(weeks);
    }

    pub fn vacation_weeks(&self) -> &BTreeSet<usize> {
        &self.vacation_weeks
    }

    // ===== PSI 缓冲区 =====

    pub fn psi(&self, layer: Layer) -> &PsiBuffer {
        match layer {
            Layer::Demand => &self.demand,
            Layer::Supply => &self.supply,
        }
    }

    pub fn psi_mut(&mut self, layer: Layer) -> &mut PsiBuffer {
        match layer {
            Layer::Demand => &mut self.demand,
            Layer::Supply => &mut self.supply,
        }
    }

    pub fn horizon(&self) -> usize {
        self.demand.horizon()
    }

    /// 两层缓冲区按规划期重新分配
    ///
    /// # 返回
    /// 各层被截断的批次
    pub fn allocate(&mut self, horizon: usize) -> Vec<(Layer, Vec<LotId>)> {
        let mut truncated = Vec::new();
        for layer in Layer::ALL {
            let dropped = self.psi_mut(layer).allocate(horizon);
            if !dropped.is_empty() {
                warn!(
                    node = %self.name,
                    layer = %layer,
                    horizon = horizon,
                    dropped = dropped.len(),
                    "规划期收缩,超出部分批次被丢弃"
                );
                truncated.push((layer, dropped));
            }
        }
        // 休假周全集保留: 平移只查询 [0, horizon) 内的周,规划期再扩展时仍然生效
        truncated
    }
}

impl LeadTimeShift for PlanNode {
    fn is_blocked(&self, week: usize) -> bool {
        self.vacation_weeks.contains(&week)
    }
}

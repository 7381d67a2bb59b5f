// ==========================================
// PSI 供需平衡引擎 - PSI 缓冲区
// ==========================================
// 职责: 单节点单层的 周 x 桶 -> 有序批次集合
// 红线: 同一 (周, 桶) 内批次号唯一
// 红线: 外部只能通过 allocate / insert / clear / balance 修改
// ==========================================

use crate::domain::lot::LotId;
use crate::domain::types::Bucket;
use std::collections::HashSet;

// ==========================================
// LotSet - 保序去重集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LotSet {
    order: Vec<LotId>,
    members: HashSet<LotId>,
}

impl LotSet {
    fn insert(&mut self, lot: LotId) -> bool {
        if self.members.contains(&lot) {
            return false;
        }
        self.members.insert(lot.clone());
        self.order.push(lot);
        true
    }

    fn remove(&mut self, lot: &LotId) -> bool {
        if !self.members.remove(lot) {
            return false;
        }
        self.order.retain(|l| l != lot);
        true
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    fn drain(&mut self) -> Vec<LotId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}

/// 单周四桶
type WeekSlot = [LotSet; 4];

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,  // 已存在,本次为空操作
    OutOfRange, // 周索引超出规划期
}

/// 平衡递推中的欠供记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderSupply {
    pub week: usize,
    pub lot: LotId,
}

// ==========================================
// PsiBuffer - PSI 缓冲区
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsiBuffer {
    weeks: Vec<WeekSlot>,
}

impl PsiBuffer {
    pub fn new(horizon: usize) -> Self {
        let mut buffer = Self::default();
        buffer.allocate(horizon);
        buffer
    }

    /// 调整规划期长度
    ///
    /// 扩展时右侧补空周;收缩时丢弃超出部分
    ///
    /// # 返回
    /// 被截断丢弃的批次(供调用方记录告警)
    pub fn allocate(&mut self, horizon: usize) -> Vec<LotId> {
        let mut dropped = Vec::new();
        if horizon < self.weeks.len() {
            for slot in self.weeks.drain(horizon..) {
                for set in slot {
                    dropped.extend(set.order);
                }
            }
        } else {
            self.weeks.resize_with(horizon, WeekSlot::default);
        }
        dropped
    }

    pub fn horizon(&self) -> usize {
        self.weeks.len()
    }

    /// 插入批次
    pub fn insert(&mut self, week: usize, bucket: Bucket, lot: LotId) -> InsertOutcome {
        match self.weeks.get_mut(week) {
            None => InsertOutcome::OutOfRange,
            Some(slot) => {
                if slot[bucket.index()].insert(lot) {
                    InsertOutcome::Inserted
                } else {
                    InsertOutcome::Duplicate
                }
            }
        }
    }

    /// 读取某周某桶 (越界返回空)
    pub fn lots(&self, week: usize, bucket: Bucket) -> &[LotId] {
        self.weeks
            .get(week)
            .map(|slot| slot[bucket.index()].order.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, week: usize, bucket: Bucket, lot: &LotId) -> bool {
        self.weeks
            .get(week)
            .map(|slot| slot[bucket.index()].members.contains(lot))
            .unwrap_or(false)
    }

    /// 某桶全期批次数
    pub fn bucket_len(&self, bucket: Bucket) -> usize {
        self.weeks.iter().map(|s| s[bucket.index()].order.len()).sum()
    }

    /// 某桶各周批次 (按周升序,周内保序)
    pub fn bucket_weeks(&self, bucket: Bucket) -> impl Iterator<Item = (usize, &[LotId])> + '_ {
        self.weeks
            .iter()
            .enumerate()
            .map(move |(w, slot)| (w, slot[bucket.index()].order.as_slice()))
    }

    /// 清空某桶全部周
    pub fn clear_bucket(&mut self, bucket: Bucket) {
        for slot in &mut self.weeks {
            slot[bucket.index()].clear();
        }
    }

    /// 取出某桶全部批次并清空 (按周)
    pub fn take_bucket(&mut self, bucket: Bucket) -> Vec<Vec<LotId>> {
        self.weeks
            .iter_mut()
            .map(|slot| slot[bucket.index()].drain())
            .collect()
    }

    /// 清空派生桶 CO / I / P
    pub fn clear_derived(&mut self) {
        for bucket in Bucket::ALL.iter().filter(|b| b.is_derived()) {
            self.clear_bucket(*bucket);
        }
    }

    // ==========================================
    // 平衡递推 (PS -> I)
    // ==========================================

    /// 由 S / P 重算 I
    ///
    /// I[0] = P[0] - S[0]
    /// I[w] = (I[w-1] ∪ P[w]) - S[w]
    ///
    /// S 中找不到可用库存的批次不扣减,记为欠供继续递推。
    /// CO 不参与递推
    ///
    /// # 返回
    /// 欠供记录 (周升序)
    pub fn balance(&mut self) -> Vec<UnderSupply> {
        let mut shortages = Vec::new();
        let inv = Bucket::Inventory.index();
        let ship = Bucket::Ship.index();
        let arrival = Bucket::Arrival.index();

        let mut carried = LotSet::default();
        for (week, slot) in self.weeks.iter_mut().enumerate() {
            let mut available = carried;
            for lot in &slot[arrival].order {
                available.insert(lot.clone());
            }
            for lot in &slot[ship].order {
                if !available.remove(lot) {
                    shortages.push(UnderSupply {
                        week,
                        lot: lot.clone(),
                    });
                }
            }
            slot[inv] = available.clone();
            carried = available;
        }
        shortages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(s: &str) -> LotId {
        LotId::new(s)
    }

    fn ids(lots: &[LotId]) -> Vec<&str> {
        lots.iter().map(|l| l.as_str()).collect()
    }

    #[test]
    fn test_insert_suppresses_duplicates() {
        let mut buf = PsiBuffer::new(4);
        assert_eq!(buf.insert(1, Bucket::Ship, lot("a")), InsertOutcome::Inserted);
        assert_eq!(buf.insert(1, Bucket::Ship, lot("a")), InsertOutcome::Duplicate);
        assert_eq!(buf.insert(1, Bucket::Arrival, lot("a")), InsertOutcome::Inserted);
        assert_eq!(buf.insert(4, Bucket::Ship, lot("b")), InsertOutcome::OutOfRange);
        assert_eq!(ids(buf.lots(1, Bucket::Ship)), vec!["a"]);
    }

    #[test]
    fn test_allocate_truncates_and_pads() {
        let mut buf = PsiBuffer::new(5);
        buf.insert(4, Bucket::Ship, lot("late"));
        buf.insert(1, Bucket::Ship, lot("early"));

        let dropped = buf.allocate(3);
        assert_eq!(ids(&dropped), vec!["late"]);
        assert_eq!(buf.horizon(), 3);

        let dropped = buf.allocate(6);
        assert!(dropped.is_empty());
        assert_eq!(buf.horizon(), 6);
        assert_eq!(ids(buf.lots(1, Bucket::Ship)), vec!["early"]);
        assert!(buf.lots(5, Bucket::Ship).is_empty());
    }

    #[test]
    fn test_balance_recurrence() {
        let mut buf = PsiBuffer::new(4);
        buf.insert(0, Bucket::Arrival, lot("a"));
        buf.insert(0, Bucket::Arrival, lot("b"));
        buf.insert(1, Bucket::Ship, lot("a"));
        buf.insert(2, Bucket::Arrival, lot("c"));
        buf.insert(3, Bucket::Ship, lot("b"));

        let shortages = buf.balance();
        assert!(shortages.is_empty());
        assert_eq!(ids(buf.lots(0, Bucket::Inventory)), vec!["a", "b"]);
        assert_eq!(ids(buf.lots(1, Bucket::Inventory)), vec!["b"]);
        assert_eq!(ids(buf.lots(2, Bucket::Inventory)), vec!["b", "c"]);
        assert_eq!(ids(buf.lots(3, Bucket::Inventory)), vec!["c"]);
    }

    #[test]
    fn test_balance_records_under_supply_without_halting() {
        let mut buf = PsiBuffer::new(3);
        buf.insert(0, Bucket::Ship, lot("ghost"));
        buf.insert(1, Bucket::Arrival, lot("x"));

        let shortages = buf.balance();
        assert_eq!(shortages, vec![UnderSupply { week: 0, lot: lot("ghost") }]);
        // S 保留作为台账
        assert_eq!(ids(buf.lots(0, Bucket::Ship)), vec!["ghost"]);
        assert_eq!(ids(buf.lots(2, Bucket::Inventory)), vec!["x"]);
    }

    #[test]
    fn test_clear_derived_keeps_ship_bucket() {
        let mut buf = PsiBuffer::new(2);
        buf.insert(0, Bucket::Ship, lot("s"));
        buf.insert(0, Bucket::CarryOver, lot("co"));
        buf.insert(0, Bucket::Arrival, lot("p"));
        buf.balance();

        buf.clear_derived();
        assert_eq!(buf.bucket_len(Bucket::Ship), 1);
        assert_eq!(buf.bucket_len(Bucket::CarryOver), 0);
        assert_eq!(buf.bucket_len(Bucket::Inventory), 0);
        assert_eq!(buf.bucket_len(Bucket::Arrival), 0);
    }

    #[test]
    fn test_balance_is_repeatable() {
        let mut buf = PsiBuffer::new(3);
        buf.insert(0, Bucket::Arrival, lot("a"));
        buf.insert(2, Bucket::Ship, lot("a"));
        buf.balance();
        let first = buf.clone();
        buf.balance();
        assert_eq!(first, buf);
    }
}

// ==========================================
// PSI 供需平衡引擎 - 日历索引
// ==========================================
// 职责: 周索引 (0..W-1) 与 (ISO 年, ISO 周) 的双向映射
// 红线: 映射单射; week_index 顺序 == 时间顺序
// 说明: 日历只读,推演期间可在所有节点间共享
// ==========================================

use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::records::CalendarRow;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;

// ==========================================
// CalendarIndex - 日历索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    weeks: Vec<(i32, u32)>,
    mondays: Vec<NaiveDate>,
    lookup: HashMap<(i32, u32), usize>,
}

impl CalendarIndex {
    /// 从日历表构建
    ///
    /// 行可以乱序,但排序后必须从 0 开始连续,且按时间严格递增
    ///
    /// # 参数
    /// - `rows`: 日历行
    ///
    /// # 返回
    /// - `Ok(CalendarIndex)`: 校验通过
    /// - `Err(PlanningError)`: 非法 ISO 周 / 不连续 / 时间倒序
    pub fn from_rows(rows: &[CalendarRow]) -> PlanningResult<Self> {
        let mut sorted: Vec<CalendarRow> = rows.to_vec();
        sorted.sort_by_key(|r| r.week_index);

        let mut index = Self::default();
        for (position, row) in sorted.iter().enumerate() {
            if row.week_index != position {
                return Err(PlanningError::NonDenseCalendar {
                    position,
                    week_index: row.week_index,
                });
            }
            let monday = iso_monday(row.iso_year, row.iso_week)?;
            if let Some(prev) = index.mondays.last() {
                if monday <= *prev {
                    return Err(PlanningError::NonChronologicalCalendar {
                        week_index: row.week_index,
                    });
                }
            }
            index.push(row.iso_year, row.iso_week, monday);
        }
        Ok(index)
    }

    /// 从起始 ISO 周生成连续 `weeks` 周的日历
    pub fn iso_weeks(start_year: i32, start_week: u32, weeks: usize) -> PlanningResult<Self> {
        let mut monday = iso_monday(start_year, start_week)?;
        let mut index = Self::default();
        for _ in 0..weeks {
            let iso = monday.iso_week();
            index.push(iso.year(), iso.week(), monday);
            monday += Duration::weeks(1);
        }
        Ok(index)
    }

    fn push(&mut self, iso_year: i32, iso_week: u32, monday: NaiveDate) {
        self.lookup.insert((iso_year, iso_week), self.weeks.len());
        self.weeks.push((iso_year, iso_week));
        self.mondays.push(monday);
    }

    // ==========================================
    // 查询
    // ==========================================

    /// (ISO 年, ISO 周) -> 周索引
    pub fn week_of(&self, iso_year: i32, iso_week: u32) -> PlanningResult<usize> {
        self.lookup
            .get(&(iso_year, iso_week))
            .copied()
            .ok_or(PlanningError::MissingCalendarEntry { iso_year, iso_week })
    }

    /// 周索引 -> (ISO 年, ISO 周)
    pub fn calendar_of(&self, week_index: usize) -> PlanningResult<(i32, u32)> {
        self.weeks
            .get(week_index)
            .copied()
            .ok_or(PlanningError::WeekOutOfHorizon {
                week_index,
                horizon: self.weeks.len(),
            })
    }

    /// 该周的周一
    pub fn monday_of(&self, week_index: usize) -> Option<NaiveDate> {
        self.mondays.get(week_index).copied()
    }

    /// 规划期长度 W
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

fn iso_monday(iso_year: i32, iso_week: u32) -> PlanningResult<NaiveDate> {
    NaiveDate::from_isoywd_opt(iso_year, iso_week, Weekday::Mon)
        .ok_or(PlanningError::InvalidIsoWeek { iso_year, iso_week })
}

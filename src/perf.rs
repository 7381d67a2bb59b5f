use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

// 0 = 未解析, 1 = 关闭, 2 = 开启
static PERF_ENABLED: AtomicU8 = AtomicU8::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static LOT_MOVES: Cell<u64> = Cell::new(0);
    static ANOMALIES: Cell<u64> = Cell::new(0);
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 性能统计是否开启
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭
/// - `PSI_PLANNER_PERF=1|0` 强制开启/关闭
pub fn enabled() -> bool {
    match PERF_ENABLED.load(Ordering::Relaxed) {
        1 => false,
        2 => true,
        _ => {
            let on = match std::env::var("PSI_PLANNER_PERF") {
                Ok(v) => is_true(&v),
                Err(_) => cfg!(debug_assertions),
            };
            PERF_ENABLED.store(if on { 2 } else { 1 }, Ordering::Relaxed);
            on
        }
    }
}

/// 记录批次移动 (由传播器在每次写入目标桶后调用)
pub fn record_lot_moves(n: usize) {
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    LOT_MOVES.with(|c| c.set(c.get().saturating_add(n as u64)));
}

/// 记录可恢复异常 (欠供/越界/重复等)
pub fn record_anomalies(n: usize) {
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    ANOMALIES.with(|c| c.set(c.get().saturating_add(n as u64)));
}

/// 性能统计 Guard：记录 elapsed_ms + 批次移动数 + 异常数
///
/// 使用方式：
/// ```ignore
/// let _perf = psi_planner::perf::PerfGuard::new("demand_pass");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    moves_start: u64,
    anomalies_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let moves_start = LOT_MOVES.with(|c| c.get());
        let anomalies_start = ANOMALIES.with(|c| c.get());
        Self {
            op,
            start: Instant::now(),
            moves_start,
            anomalies_start,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        if enabled() {
            let elapsed_ms = self.start.elapsed().as_millis() as u64;
            let lot_moves = LOT_MOVES.with(|c| c.get()).saturating_sub(self.moves_start);
            let anomalies = ANOMALIES
                .with(|c| c.get())
                .saturating_sub(self.anomalies_start);

            tracing::info!(
                target: "perf",
                op = self.op,
                elapsed_ms,
                lot_moves,
                anomalies,
                "done"
            );
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

// ==========================================
// PSI 供需平衡引擎 - 引擎层
// ==========================================
// 职责: 批次平移、汇总、平衡、平准化与全树推演
// 红线: 引擎不做 I/O,所有异常以 Anomaly 结构返回
// ==========================================

pub mod aggregation;
pub mod balance;
pub mod decouple;
pub mod demand_propagation;
pub mod leveling;
pub mod orchestrator;
pub mod report;
pub mod seeding;
pub mod shifter;
pub mod snapshot;
pub mod walker;

// 重导出核心引擎
pub use aggregation::{AggregationResult, SupplyAggregator};
pub use balance::BalanceEngine;
pub use decouple::{DecoupleEvaluation, DecouplePlanner};
pub use demand_propagation::{DemandPropagator, PropagationResult};
pub use leveling::{CapacityConstraint, CapacityLeveler, LevelingResult, WeeklyCapacity};
pub use orchestrator::{PlanningOutcome, ProductOutcome, PsiOrchestrator};
pub use report::{Anomaly, AnomalyTotals, RunReport};
pub use seeding::{PsiSeeder, SeedResult, TemplateBook};
pub use shifter::{LotMove, LotShifter};
pub use snapshot::psi_snapshot;
pub use walker::{PassResult, TreeWalker};

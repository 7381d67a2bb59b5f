// ==========================================
// PSI 供需平衡引擎 - 领域模型层
// ==========================================
// 职责: 定义值对象、节点树与 PSI 缓冲区
// 红线: 不含引擎逻辑,不做 I/O
// ==========================================

pub mod calendar;
pub mod error;
pub mod lot;
pub mod node;
pub mod psi;
pub mod records;
pub mod tree;
pub mod types;

// 重导出核心类型
pub use calendar::CalendarIndex;
pub use error::{PlanningError, PlanningResult};
pub use lot::{LotId, LotParts};
pub use node::{LeadTimeShift, NodeId, PlanNode, ShiftOutcome};
pub use psi::{InsertOutcome, PsiBuffer, UnderSupply};
pub use records::{
    CalendarRow, ConfirmedShipmentRow, DemandRow, PlanningHorizon, PlanningInput, SnapshotRow,
    TemplateRow, TreeRow, VacationRow,
};
pub use tree::{SupplyTree, Truncation};
pub use types::{AggregationPolicy, Bucket, Layer, LotFormatMode, NodeSide, ShiftDirection};

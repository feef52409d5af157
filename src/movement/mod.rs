//! BRR movement: monetary correction, per-checkpoint depreciation and
//! cash-flow reconciliation

mod cashflows;
mod correction;
mod engine;
pub mod irr;
mod schedule;
mod snapshot;
mod summary;

pub use cashflows::{
    build_cash_flow, reconcile, truncate_at_zero_flow, CashFlowLine, Reconciliation, Verdict,
    IRR_TOLERANCE,
};
pub use correction::{correct_monetarily, CorrectionSummary, MonetaryCorrection};
pub use engine::{Movement, MovementConfig, MovementEngine, MovementResult, DEFAULT_FINANCING_RATE};
pub use irr::{IrrSolver, NewtonSolver, PolynomialSolver};
pub use schedule::schedule;
pub use snapshot::{snapshot, CheckpointResult, DecoratedAsset, PeriodSnapshot};
pub use summary::{MovementSummary, ResidualBalances};

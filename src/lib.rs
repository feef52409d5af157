//! BRR Movement - regulatory asset base depreciation and reconciliation engine
//!
//! This library provides:
//! - Asset ledger ingestion with identifier and schema integrity checks
//! - Price index normalization, interpolation and monetary correction
//! - Eligibility-aware regulatory depreciation at fiscal-year checkpoints
//! - Cash-flow reconciliation of the movement against the financing rate
//! - Reporting, CSV export and multi-scenario batch runs

pub mod dates;
pub mod eligibility;
pub mod error;
pub mod export;
pub mod index;
pub mod ledger;
pub mod movement;
pub mod report;
pub mod scenario;

// Re-export commonly used types
pub use eligibility::{EligibilityEvent, EligibilityRegister};
pub use error::{BrrError, BrrResult};
pub use index::{InterpolatedIndex, PriceIndexPoint};
pub use ledger::{AssetRecord, Eligibility, Ledger};
pub use movement::{MovementConfig, MovementEngine, MovementResult, PeriodSnapshot, Verdict};
pub use scenario::MovementRunner;

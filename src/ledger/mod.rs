//! Asset ledger structures, integrity checks and loading

mod data;
mod validate;
pub mod loader;

pub use data::{derive_iu, AssetRecord, Eligibility, LedgerRow};
pub use validate::Ledger;
pub use loader::{load_ledger, load_ledger_from_reader, REQUIRED_COLUMNS};

//! Scenario runner for batches of movements
//!
//! Holds the validated ledger, index and eligibility register once, then
//! runs many configurations (horizons, reference dates, financing rates)
//! without re-reading any file.

use rayon::prelude::*;
use std::path::Path;

use crate::eligibility::{load_register, EligibilityRegister};
use crate::error::BrrResult;
use crate::index::{load_index, InterpolatedIndex};
use crate::ledger::{load_ledger, Ledger};
use crate::movement::{MovementConfig, MovementEngine, MovementResult};

/// Pre-loaded inputs for batch runs
///
/// # Example
/// ```ignore
/// let runner = MovementRunner::from_csv("brr.csv", "ipca.csv", Some("eleg.csv"))?;
/// let configs: Vec<_> = [0.10, 0.1182768]
///     .iter()
///     .map(|&r| MovementConfig::new(reference, horizon).with_financing_rate(r))
///     .collect();
/// let results = runner.run_scenarios(&configs);
/// ```
#[derive(Debug, Clone)]
pub struct MovementRunner {
    ledger: Ledger,
    index: InterpolatedIndex,
    register: Option<EligibilityRegister>,
}

impl MovementRunner {
    pub fn new(ledger: Ledger, index: InterpolatedIndex, register: Option<EligibilityRegister>) -> Self {
        Self {
            ledger,
            index,
            register,
        }
    }

    /// Load ledger, index and (optionally) eligibility events from CSV files
    pub fn from_csv<P: AsRef<Path>>(ledger: P, index: P, events: Option<P>) -> BrrResult<Self> {
        let register = events.map(load_register).transpose()?;
        Ok(Self {
            ledger: load_ledger(ledger)?,
            index: load_index(index)?,
            register,
        })
    }

    /// Run a single movement with the given config.
    /// Clones the index and register into the engine.
    pub fn run(&self, config: MovementConfig) -> BrrResult<MovementResult> {
        MovementEngine::new(self.index.clone(), self.register.clone(), config).run(&self.ledger)
    }

    /// Run several configurations in parallel; results follow `configs` order
    pub fn run_scenarios(&self, configs: &[MovementConfig]) -> Vec<BrrResult<MovementResult>> {
        configs.par_iter().map(|config| self.run(config.clone())).collect()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn index(&self) -> &InterpolatedIndex {
        &self.index
    }
}

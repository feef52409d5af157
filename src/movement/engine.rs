//! Movement engine: corrects the ledger, depreciates it at every checkpoint
//! and reconciles the resulting cash flow

use chrono::NaiveDate;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cashflows::{reconcile, Reconciliation};
use super::correction::{correct_monetarily, MonetaryCorrection};
use super::irr::{IrrSolver, PolynomialSolver};
use super::schedule::schedule;
use super::snapshot::{snapshot, DecoratedAsset, PeriodSnapshot};
use super::summary::{MovementSummary, ResidualBalances};
use crate::eligibility::EligibilityRegister;
use crate::error::{BrrError, BrrResult};
use crate::index::InterpolatedIndex;
use crate::ledger::Ledger;

/// Default regulatory remuneration rate (WACC) used to finance the base
pub const DEFAULT_FINANCING_RATE: f64 = 0.1182768;

fn default_financing_rate() -> f64 {
    DEFAULT_FINANCING_RATE
}

/// Parameters of a movement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Prices every value is restated at
    pub monetary_reference_date: NaiveDate,

    /// Last evaluation date
    pub horizon_date: NaiveDate,

    /// Annual rate the base is remunerated at
    #[serde(default = "default_financing_rate")]
    pub financing_rate: f64,
}

impl MovementConfig {
    pub fn new(monetary_reference_date: NaiveDate, horizon_date: NaiveDate) -> Self {
        Self {
            monetary_reference_date,
            horizon_date,
            financing_rate: DEFAULT_FINANCING_RATE,
        }
    }

    pub fn with_financing_rate(mut self, financing_rate: f64) -> Self {
        self.financing_rate = financing_rate;
        self
    }
}

/// Corrected ledger and its snapshot series
#[derive(Debug, Clone)]
pub struct Movement {
    pub correction: MonetaryCorrection,
    pub checkpoints: Vec<NaiveDate>,
    pub snapshots: Vec<PeriodSnapshot>,
    /// Decorated ledger at the horizon
    pub final_assets: Vec<DecoratedAsset>,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct MovementResult {
    pub config: MovementConfig,
    pub movement: Movement,
    pub reconciliation: Reconciliation,
    pub summary: MovementSummary,
    pub residuals: ResidualBalances,
}

/// Depreciation quota and average rate of each period, from the
/// accumulated depreciation series
fn apply_quotas(snapshots: &mut [PeriodSnapshot]) {
    let mut prior_acc = 0.0;
    for snap in snapshots.iter_mut() {
        snap.qrr = snap.accumulated_depreciation - prior_acc;
        snap.tdr = if snap.gross_brr > 0.0 {
            snap.qrr / snap.gross_brr
        } else {
            0.0
        };
        prior_acc = snap.accumulated_depreciation;
    }
}

/// Main movement engine
pub struct MovementEngine {
    index: InterpolatedIndex,
    register: Option<EligibilityRegister>,
    config: MovementConfig,
    solver: Box<dyn IrrSolver>,
}

impl MovementEngine {
    pub fn new(
        index: InterpolatedIndex,
        register: Option<EligibilityRegister>,
        config: MovementConfig,
    ) -> Self {
        Self {
            index,
            register,
            config,
            solver: Box::new(PolynomialSolver::default()),
        }
    }

    /// Replace the IRR solver used by the reconciliation
    pub fn with_solver(mut self, solver: Box<dyn IrrSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Correct the ledger once and depreciate it at every checkpoint
    pub fn movement(&self, ledger: &Ledger) -> BrrResult<Movement> {
        let first = ledger
            .first_immobilization()
            .ok_or_else(|| BrrError::schema("iu", "ledger has no assets"))?;
        let reference = self.config.monetary_reference_date;

        let correction = correct_monetarily(ledger, &self.index, reference)?;
        let checkpoints = schedule(first, self.config.horizon_date);
        info!(
            "Depreciating {} assets over {} checkpoints ({} to {})",
            ledger.len(),
            checkpoints.len(),
            checkpoints[0],
            self.config.horizon_date
        );

        let last = checkpoints.len() - 1;
        let register = self.register.as_ref();
        let results: Vec<(PeriodSnapshot, Option<Vec<DecoratedAsset>>)> = checkpoints
            .par_iter()
            .enumerate()
            .map(|(i, &date)| {
                let result = snapshot(&correction.ledger, date, reference, register);
                debug!(
                    "{}: gross {:.2}, net {:.2}, accumulated {:.2}",
                    date,
                    result.snapshot.gross_brr,
                    result.snapshot.net_brr,
                    result.snapshot.accumulated_depreciation
                );
                (result.snapshot, (i == last).then_some(result.assets))
            })
            .collect();

        let mut final_assets = Vec::new();
        let mut snapshots = Vec::with_capacity(results.len());
        for (snap, assets) in results {
            snapshots.push(snap);
            if let Some(assets) = assets {
                final_assets = assets;
            }
        }
        apply_quotas(&mut snapshots);

        Ok(Movement {
            correction,
            checkpoints,
            snapshots,
            final_assets,
        })
    }

    /// Full run: movement, cash-flow reconciliation, summary and residuals
    pub fn run(&self, ledger: &Ledger) -> BrrResult<MovementResult> {
        let movement = self.movement(ledger)?;
        let reconciliation = reconcile(
            &movement.snapshots,
            self.config.financing_rate,
            self.solver.as_ref(),
        )?;
        let summary = MovementSummary::from_snapshots(&movement.snapshots);
        let residuals = ResidualBalances::from_assets(&movement.final_assets);
        info!(
            "Movement to {} done: total QRR {:.2}, residual net {:.2} in {} assets",
            self.config.horizon_date,
            summary.total_qrr,
            residuals.total_net(),
            residuals.non_amortizable.len() + residuals.amortizable.len()
        );

        Ok(MovementResult {
            config: self.config.clone(),
            movement,
            reconciliation,
            summary,
            residuals,
        })
    }
}

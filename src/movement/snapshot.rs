//! Depreciation state of the ledger at a single evaluation date

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::dates::{fiscal_year_start, years_between};
use crate::eligibility::EligibilityRegister;
use crate::ledger::{AssetRecord, Eligibility, Ledger};

/// One asset decorated with its depreciation state at an evaluation date
#[derive(Debug, Clone, Serialize)]
pub struct DecoratedAsset {
    pub asset: AssetRecord,

    /// Date the depreciation clock reads (frozen on ineligibility)
    pub clock_date: NaiveDate,

    /// Eligibility in force at the evaluation date
    pub eligibility: Eligibility,

    /// Useful life in years; `None` when the rate is zero
    pub useful_life_years: Option<f64>,

    /// Annual depreciation as a fraction of value
    pub annual_rate: f64,

    pub annual_depreciation_amount: f64,

    /// Consumed useful life, clamped to `[0, useful_life_years]`
    pub consumed_years: f64,

    pub accumulated_depreciation: f64,

    /// Net regulatory value (VRL)
    pub net_value: f64,

    pub fully_consumed: bool,

    /// Zero depreciation rate: never accrues depreciation
    pub non_amortizable: bool,
}

impl DecoratedAsset {
    /// Counts toward the gross/net regulatory base
    pub fn in_base(&self) -> bool {
        !self.fully_consumed && self.eligibility.is_eligible()
    }
}

/// Aggregate regulatory base at one checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub evaluation_date: NaiveDate,

    /// Prices the values are expressed in
    pub monetary_reference_date: NaiveDate,

    /// Gross value immobilized in the fiscal year up to the evaluation date
    pub period_investment: f64,

    pub gross_brr: f64,
    pub net_brr: f64,

    /// Accumulated depreciation over every immobilized asset
    pub accumulated_depreciation: f64,

    pub ineligible_gross: f64,
    pub ineligible_net: f64,

    /// Depreciation quota of the period (QRR)
    pub qrr: f64,

    /// Average depreciation rate of the period (TDR)
    pub tdr: f64,

    /// Running net balance
    pub balance: f64,
}

/// Snapshot together with the decorated ledger it was computed from
#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub assets: Vec<DecoratedAsset>,
    pub snapshot: PeriodSnapshot,
}

/// Consumed useful life under the clamping rules: negative elapsed time
/// counts as zero, and consumption never exceeds the useful life
fn consumed_years(elapsed: f64, useful_life: Option<f64>) -> f64 {
    let consumed = if elapsed < 0.0 { 0.0 } else { elapsed };
    match useful_life {
        Some(life) if consumed > life => life,
        _ => consumed,
    }
}

fn decorate(asset: &AssetRecord, clock_date: NaiveDate, eligibility: Eligibility) -> DecoratedAsset {
    let useful_life_years = asset.useful_life_years();
    let annual_depreciation_amount = asset.annual_depreciation_amount();
    let consumed = consumed_years(years_between(asset.data_imob, clock_date), useful_life_years);
    let accumulated_depreciation = consumed * annual_depreciation_amount;

    DecoratedAsset {
        asset: asset.clone(),
        clock_date,
        eligibility,
        useful_life_years,
        annual_rate: asset.annual_rate(),
        annual_depreciation_amount,
        consumed_years: consumed,
        accumulated_depreciation,
        net_value: asset.vrb - accumulated_depreciation,
        fully_consumed: useful_life_years.is_some_and(|life| consumed >= life),
        non_amortizable: useful_life_years.is_none(),
    }
}

/// Depreciate the ledger to `evaluation_date`.
///
/// Assets immobilized after the evaluation date are left out. With a
/// register, eligibility changes recorded before the evaluation date
/// override the ledger's clock and eligibility.
pub fn snapshot(
    ledger: &Ledger,
    evaluation_date: NaiveDate,
    monetary_reference_date: NaiveDate,
    register: Option<&EligibilityRegister>,
) -> CheckpointResult {
    let immobilized: Vec<&AssetRecord> = ledger
        .assets()
        .iter()
        .filter(|a| a.data_imob <= evaluation_date)
        .collect();
    let immobilized_ius: HashSet<&str> = immobilized.iter().map(|a| a.iu.as_str()).collect();

    let assets: Vec<DecoratedAsset> = immobilized
        .iter()
        .map(|asset| match register {
            Some(register) => {
                let resolved =
                    register.resolve(&asset.iu, evaluation_date, &immobilized_ius, asset.elegibilidade);
                decorate(asset, resolved.clock_date, resolved.eligibility)
            }
            None => decorate(asset, evaluation_date, asset.elegibilidade),
        })
        .collect();

    let year_start = fiscal_year_start(evaluation_date);
    let in_fiscal_year = |date: NaiveDate| date >= year_start && date <= evaluation_date;

    let mut snap = PeriodSnapshot {
        evaluation_date,
        monetary_reference_date,
        period_investment: 0.0,
        gross_brr: 0.0,
        net_brr: 0.0,
        accumulated_depreciation: 0.0,
        ineligible_gross: 0.0,
        ineligible_net: 0.0,
        qrr: 0.0,
        tdr: 0.0,
        balance: 0.0,
    };

    for a in &assets {
        snap.accumulated_depreciation += a.accumulated_depreciation;
        if a.in_base() {
            snap.gross_brr += a.asset.vrb;
            snap.net_brr += a.net_value;
        }
        if !a.fully_consumed && !a.eligibility.is_eligible() && in_fiscal_year(a.clock_date) {
            snap.ineligible_gross += a.asset.vrb;
            snap.ineligible_net += a.net_value;
        }
        if in_fiscal_year(a.asset.data_imob) {
            snap.period_investment += a.asset.vrb;
        }
    }
    snap.balance = snap.net_brr;

    CheckpointResult {
        assets,
        snapshot: snap,
    }
}

//! Aggregate figures of a finished movement

use serde::Serialize;

use super::snapshot::{DecoratedAsset, PeriodSnapshot};

/// Totals over the whole movement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementSummary {
    pub checkpoints: usize,
    pub total_qrr: f64,
    pub total_investment: f64,
    pub final_gross_brr: f64,
    pub final_net_brr: f64,
    pub final_accumulated_depreciation: f64,
    /// Gross minus net base at the last checkpoint
    pub final_gross_net_difference: f64,
}

impl MovementSummary {
    pub fn from_snapshots(snapshots: &[PeriodSnapshot]) -> Self {
        let Some(last) = snapshots.last() else {
            return Self::default();
        };
        Self {
            checkpoints: snapshots.len(),
            total_qrr: snapshots.iter().map(|s| s.qrr).sum(),
            total_investment: snapshots.iter().map(|s| s.period_investment).sum(),
            final_gross_brr: last.gross_brr,
            final_net_brr: last.net_brr,
            final_accumulated_depreciation: last.accumulated_depreciation,
            final_gross_net_difference: last.gross_brr - last.net_brr,
        }
    }
}

/// Eligible assets still carrying net value at the horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResidualBalances {
    /// Zero-rate assets, which never depreciate
    pub non_amortizable: Vec<String>,
    pub non_amortizable_net: f64,
    pub amortizable: Vec<String>,
    pub amortizable_net: f64,
}

impl ResidualBalances {
    /// Collect eligible assets whose net value does not round to zero
    pub fn from_assets(assets: &[DecoratedAsset]) -> Self {
        let mut residuals = Self::default();
        for a in assets
            .iter()
            .filter(|a| a.eligibility.is_eligible() && a.net_value.round() != 0.0)
        {
            if a.non_amortizable {
                residuals.non_amortizable.push(a.asset.iu.clone());
                residuals.non_amortizable_net += a.net_value;
            } else {
                residuals.amortizable.push(a.asset.iu.clone());
                residuals.amortizable_net += a.net_value;
            }
        }
        residuals
    }

    pub fn total_net(&self) -> f64 {
        self.non_amortizable_net + self.amortizable_net
    }

    pub fn is_empty(&self) -> bool {
        self.non_amortizable.is_empty() && self.amortizable.is_empty()
    }
}

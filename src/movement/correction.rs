//! Monetary correction of the ledger to a single reference date

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::error::BrrResult;
use crate::index::InterpolatedIndex;
use crate::ledger::{AssetRecord, Ledger};

/// Ledger restated at `reference_date` prices, with the audit trail of the correction
#[derive(Debug, Clone)]
pub struct MonetaryCorrection {
    pub reference_date: NaiveDate,

    /// Corrected ledger; `vrb` is restated and `data_monet` moved to the reference date
    pub ledger: Ledger,

    /// Index ratio applied to each asset, in ledger order
    pub ratios: Vec<f64>,

    pub original_total: f64,
    pub corrected_total: f64,

    /// Assets whose restated/original value ratio disagrees with the
    /// applied index ratio at four decimal places
    pub divergent: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectionSummary {
    pub reference_date: NaiveDate,
    pub original_total: f64,
    pub corrected_total: f64,
    pub average_variation: f64,
    pub divergent_count: usize,
}

impl MonetaryCorrection {
    /// Aggregate variation of the base: corrected / original - 1
    pub fn average_variation(&self) -> f64 {
        if self.original_total == 0.0 {
            0.0
        } else {
            self.corrected_total / self.original_total - 1.0
        }
    }

    pub fn summary(&self) -> CorrectionSummary {
        CorrectionSummary {
            reference_date: self.reference_date,
            original_total: self.original_total,
            corrected_total: self.corrected_total,
            average_variation: self.average_variation(),
            divergent_count: self.divergent.len(),
        }
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Restate every asset's gross value at `reference_date`.
///
/// Each asset is corrected once, from its own `data_monet`; fails with
/// `OutOfRange` when either date falls outside the index coverage.
pub fn correct_monetarily(
    ledger: &Ledger,
    index: &InterpolatedIndex,
    reference_date: NaiveDate,
) -> BrrResult<MonetaryCorrection> {
    info!(
        "Correcting {} assets to prices of {}",
        ledger.len(),
        reference_date.format("%d/%m/%Y")
    );

    let ratios = ledger
        .assets()
        .iter()
        .map(|a| index.ratio(a.data_monet, reference_date))
        .collect::<BrrResult<Vec<f64>>>()?;

    let corrected = ledger.map_assets(|i, asset| AssetRecord {
        vrb: asset.vrb * ratios[i],
        data_monet: reference_date,
        ..asset.clone()
    });

    let divergent: Vec<String> = ledger
        .assets()
        .iter()
        .zip(corrected.assets())
        .zip(&ratios)
        .filter(|((before, _), _)| before.vrb != 0.0)
        .filter(|((before, after), ratio)| round4(after.vrb / before.vrb) != round4(**ratio))
        .map(|((before, _), _)| before.iu.clone())
        .collect();
    if !divergent.is_empty() {
        warn!("Monetary correction diverges for {} assets", divergent.len());
    }

    let correction = MonetaryCorrection {
        reference_date,
        original_total: ledger.total_vrb(),
        corrected_total: corrected.total_vrb(),
        ledger: corrected,
        ratios,
        divergent,
    };
    info!(
        "Monetary correction done, average index variation {:.2}%",
        correction.average_variation() * 100.0
    );
    Ok(correction)
}

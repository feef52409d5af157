//! Asset ledger data structures matching the regulatory base format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BrrError;

/// Whether an asset counts toward the regulatory base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eligibility {
    Eligible,
    Ineligible,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    /// Label used in the regulatory base files
    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "Elegível",
            Eligibility::Ineligible => "Não elegível",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Eligibility {
    type Err = BrrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elegível" | "elegivel" | "eligible" => Ok(Eligibility::Eligible),
            "não elegível" | "nao elegivel" | "não elegivel" | "ineligible" => {
                Ok(Eligibility::Ineligible)
            }
            _ => Err(BrrError::InvalidValue {
                field: "elegibilidade".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Build the unique asset identifier from type, tag and complement.
///
/// Each component is cut at its first `.` so that values read back from
/// spreadsheets as floats (`1234.0`) yield the same identifier as integers.
pub fn derive_iu(asset_type: &str, tag: &str, complement: &str) -> String {
    fn strip(component: &str) -> &str {
        component.split('.').next().unwrap_or(component)
    }
    format!("{}-{}-{}", strip(asset_type), strip(tag), strip(complement))
}

/// A single asset of the regulatory base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique identifier (`type-tag-complement`)
    pub iu: String,

    /// Asset type code
    pub asset_type: String,

    /// Physical tag (plaqueta)
    pub tag: String,

    /// Identifier complement
    pub complement: String,

    /// Gross regulatory value, denominated at `data_monet`
    pub vrb: f64,

    /// Annual regulatory depreciation rate in percent (10.0 = 10%/year)
    pub taxa_deprec_anos: f64,

    /// Immobilization date
    pub data_imob: NaiveDate,

    /// Date the stored `vrb` is denominated at
    pub data_monet: NaiveDate,

    pub elegibilidade: Eligibility,

    pub qtde: f64,

    #[serde(default)]
    pub conta_contabil: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub servico: String,
    #[serde(default)]
    pub descricao: String,

    /// Tariff review cycle the asset was appraised in
    #[serde(default)]
    pub rtp: Option<u32>,
}

impl AssetRecord {
    /// Depreciation rate as a fraction of value per year
    pub fn annual_rate(&self) -> f64 {
        self.taxa_deprec_anos / 100.0
    }

    /// Useful life in years; `None` for non-amortizable assets (zero rate)
    pub fn useful_life_years(&self) -> Option<f64> {
        if self.taxa_deprec_anos == 0.0 {
            None
        } else {
            Some(1.0 / self.annual_rate())
        }
    }

    /// Monetary amount depreciated per year
    pub fn annual_depreciation_amount(&self) -> f64 {
        self.annual_rate() * self.vrb
    }

    pub fn is_amortizable(&self) -> bool {
        self.taxa_deprec_anos != 0.0
    }

    /// Identifier re-derived from type, tag and complement
    pub fn expected_iu(&self) -> String {
        derive_iu(&self.asset_type, &self.tag, &self.complement)
    }
}

/// Raw ledger row as ingested, before integrity checks.
///
/// Required fields are optional here so that missing values can be
/// reported as schema errors instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerRow {
    pub iu: Option<String>,
    #[serde(alias = "tipo")]
    pub asset_type: Option<String>,
    #[serde(alias = "plaqueta")]
    pub tag: Option<String>,
    #[serde(alias = "complemento")]
    pub complement: Option<String>,
    pub vrb: Option<f64>,
    pub taxa_deprec_anos: Option<f64>,
    pub data_imob: Option<String>,
    pub data_monet: Option<String>,
    pub elegibilidade: Option<String>,
    pub qtde: Option<f64>,
    #[serde(default)]
    pub conta_contabil: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub servico: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub rtp: Option<f64>,
}

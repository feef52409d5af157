//! Integrity checks that turn raw ledger rows into a validated ledger

use log::{debug, info};
use std::collections::HashMap;

use super::data::{AssetRecord, Eligibility, LedgerRow};
use crate::dates::parse_date;
use crate::error::{BrrError, BrrResult, IdentifierMismatch};

/// Validated asset ledger.
///
/// Construction guarantees unique, well-formed identifiers and non-null
/// depreciation rates and quantities for every asset.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    assets: Vec<AssetRecord>,
}

impl Ledger {
    /// Validate raw rows and build the ledger.
    ///
    /// Checks run in the same order the base is audited: identifier
    /// presence, duplicates, identifier composition, then depreciation rate
    /// and quantity. Every offending row is collected before failing.
    pub fn from_rows(rows: Vec<LedgerRow>) -> BrrResult<Self> {
        check_identifiers(&rows)?;
        check_required_numbers(&rows)?;

        let assets = rows
            .into_iter()
            .map(to_asset)
            .collect::<BrrResult<Vec<_>>>()?;

        info!("Ledger validated: {} assets", assets.len());
        Ok(Self { assets })
    }

    /// Build from already-typed records, re-running the identifier checks
    pub fn from_records(assets: Vec<AssetRecord>) -> BrrResult<Self> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut mismatches = Vec::new();
        for (row, asset) in assets.iter().enumerate() {
            if asset.iu.trim().is_empty() {
                return Err(BrrError::schema("iu", format!("empty identifier at row {row}")));
            }
            *seen.entry(asset.iu.as_str()).or_default() += 1;
            let expected = asset.expected_iu();
            if expected != asset.iu {
                mismatches.push(IdentifierMismatch {
                    row,
                    stored: asset.iu.clone(),
                    expected,
                });
            }
            if asset.taxa_deprec_anos < 0.0 {
                return Err(BrrError::schema(
                    "taxa_deprec_anos",
                    format!("negative rate for asset {}", asset.iu),
                ));
            }
        }
        let mut duplicated: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(iu, _)| iu.to_string())
            .collect();
        if !duplicated.is_empty() {
            duplicated.sort();
            return Err(BrrError::DuplicateIdentifier { ius: duplicated });
        }
        if !mismatches.is_empty() {
            return Err(BrrError::MalformedIdentifier { mismatches });
        }
        Ok(Self { assets })
    }

    pub fn assets(&self) -> &[AssetRecord] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Earliest immobilization date on the ledger
    pub fn first_immobilization(&self) -> Option<chrono::NaiveDate> {
        self.assets.iter().map(|a| a.data_imob).min()
    }

    /// Highest tariff review cycle found on the ledger
    pub fn tariff_review_cycle(&self) -> u32 {
        self.assets.iter().filter_map(|a| a.rtp).max().unwrap_or(0)
    }

    pub fn total_vrb(&self) -> f64 {
        self.assets.iter().map(|a| a.vrb).sum()
    }

    /// New ledger with each asset (and its position) passed through `f`.
    /// Identifiers must be left unchanged.
    pub(crate) fn map_assets<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, &AssetRecord) -> AssetRecord,
    {
        Self {
            assets: self.assets.iter().enumerate().map(|(i, a)| f(i, a)).collect(),
        }
    }
}

fn check_identifiers(rows: &[LedgerRow]) -> BrrResult<()> {
    let empty: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.iu.as_deref().map(str::trim).unwrap_or("").is_empty())
        .map(|(i, _)| i)
        .collect();
    if !empty.is_empty() {
        return Err(BrrError::schema(
            "iu",
            format!("null or empty identifiers at rows {:?}", empty),
        ));
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        if let Some(iu) = row.iu.as_deref() {
            *counts.entry(iu).or_default() += 1;
        }
    }
    let mut duplicated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(iu, _)| iu.to_string())
        .collect();
    if !duplicated.is_empty() {
        duplicated.sort();
        return Err(BrrError::DuplicateIdentifier { ius: duplicated });
    }

    check_component(rows, "tipo", |r| r.asset_type.as_deref())?;
    check_component(rows, "plaqueta", |r| r.tag.as_deref())?;

    let mismatches: Vec<IdentifierMismatch> = rows
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let stored = r.iu.clone().unwrap_or_default();
            let expected = crate::ledger::derive_iu(
                r.asset_type.as_deref().unwrap_or(""),
                r.tag.as_deref().unwrap_or(""),
                r.complement.as_deref().unwrap_or(""),
            );
            (expected != stored).then_some(IdentifierMismatch {
                row,
                stored,
                expected,
            })
        })
        .collect();
    if !mismatches.is_empty() {
        for m in &mismatches {
            debug!("row {}: iu '{}' should be '{}'", m.row, m.stored, m.expected);
        }
        return Err(BrrError::MalformedIdentifier { mismatches });
    }

    Ok(())
}

/// Type and tag must be present to derive the identifier
fn check_component<F>(rows: &[LedgerRow], column: &str, get: F) -> BrrResult<()>
where
    F: Fn(&LedgerRow) -> Option<&str>,
{
    let missing: Vec<&str> = rows
        .iter()
        .filter(|r| get(*r).map(str::trim).unwrap_or("").is_empty())
        .filter_map(|r| r.iu.as_deref())
        .collect();
    if !missing.is_empty() {
        return Err(BrrError::schema(
            column,
            format!("null identifier component for {}", missing.join(", ")),
        ));
    }
    Ok(())
}

/// Tariff review cycles are non-negative whole numbers
fn parse_cycle(value: Option<f64>) -> BrrResult<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) => Ok(Some(v as u32)),
        Some(v) => Err(BrrError::InvalidValue {
            field: "rtp".to_string(),
            value: v.to_string(),
        }),
    }
}

fn check_required_numbers(rows: &[LedgerRow]) -> BrrResult<()> {
    let missing_rate: Vec<&str> = rows
        .iter()
        .filter(|r| r.taxa_deprec_anos.is_none())
        .filter_map(|r| r.iu.as_deref())
        .collect();
    if !missing_rate.is_empty() {
        return Err(BrrError::schema(
            "taxa_deprec_anos",
            format!("null depreciation rate for {}", missing_rate.join(", ")),
        ));
    }

    let negative_rate: Vec<&str> = rows
        .iter()
        .filter(|r| r.taxa_deprec_anos.is_some_and(|t| t < 0.0))
        .filter_map(|r| r.iu.as_deref())
        .collect();
    if !negative_rate.is_empty() {
        return Err(BrrError::schema(
            "taxa_deprec_anos",
            format!("negative depreciation rate for {}", negative_rate.join(", ")),
        ));
    }

    let missing_qty: Vec<&str> = rows
        .iter()
        .filter(|r| r.qtde.is_none())
        .filter_map(|r| r.iu.as_deref())
        .collect();
    if !missing_qty.is_empty() {
        return Err(BrrError::schema(
            "qtde",
            format!("null quantity for {}", missing_qty.join(", ")),
        ));
    }

    Ok(())
}

fn required<'a>(value: &'a Option<String>, column: &str, iu: &str) -> BrrResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BrrError::schema(column, format!("null value for asset {iu}")))
}

fn to_asset(row: LedgerRow) -> BrrResult<AssetRecord> {
    let iu = row.iu.clone().unwrap_or_default();

    let vrb = row
        .vrb
        .ok_or_else(|| BrrError::schema("vrb", format!("null value for asset {iu}")))?;
    let data_imob = parse_date(required(&row.data_imob, "data_imob", &iu)?)?;
    let data_monet = parse_date(required(&row.data_monet, "data_monet", &iu)?)?;
    let elegibilidade: Eligibility = required(&row.elegibilidade, "elegibilidade", &iu)?.parse()?;

    Ok(AssetRecord {
        asset_type: row.asset_type.unwrap_or_default(),
        tag: row.tag.unwrap_or_default(),
        complement: row.complement.unwrap_or_default(),
        vrb,
        // Presence checked in check_required_numbers
        taxa_deprec_anos: row.taxa_deprec_anos.unwrap_or_default(),
        data_imob,
        data_monet,
        elegibilidade,
        qtde: row.qtde.unwrap_or_default(),
        conta_contabil: row.conta_contabil.unwrap_or_default(),
        municipio: row.municipio.unwrap_or_default(),
        servico: row.servico.unwrap_or_default(),
        descricao: row.descricao.unwrap_or_default(),
        rtp: parse_cycle(row.rtp)?,
        iu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(iu: &str, t: &str, tag: &str, c: &str) -> LedgerRow {
        LedgerRow {
            iu: Some(iu.to_string()),
            asset_type: Some(t.to_string()),
            tag: Some(tag.to_string()),
            complement: Some(c.to_string()),
            vrb: Some(1000.0),
            taxa_deprec_anos: Some(10.0),
            data_imob: Some("2020-01-01".to_string()),
            data_monet: Some("31/12/2020".to_string()),
            elegibilidade: Some("Elegível".to_string()),
            qtde: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_ledger() {
        let ledger = Ledger::from_rows(vec![row("1-10-0", "1", "10", "0"), row("1-11-0", "1.0", "11", "0")])
            .expect("valid ledger");
        assert_eq!(ledger.len(), 2);
        assert_eq!(
            ledger.first_immobilization(),
            chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
        );
    }

    #[test]
    fn test_empty_identifier_is_schema_error() {
        let mut bad = row("1-10-0", "1", "10", "0");
        bad.iu = Some("  ".to_string());
        let err = Ledger::from_rows(vec![bad]).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "iu"));
    }

    #[test]
    fn test_duplicate_identifier() {
        let err = Ledger::from_rows(vec![row("1-10-0", "1", "10", "0"), row("1-10-0", "1", "10", "0")])
            .unwrap_err();
        match err {
            BrrError::DuplicateIdentifier { ius } => assert_eq!(ius, vec!["1-10-0".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_identifier_reports_expected() {
        let err = Ledger::from_rows(vec![row("1-10-0", "1", "10", "0"), row("1-99-0", "1", "12", "0")])
            .unwrap_err();
        match err {
            BrrError::MalformedIdentifier { mismatches } => {
                assert_eq!(mismatches.len(), 1);
                assert_eq!(mismatches[0].row, 1);
                assert_eq!(mismatches[0].expected, "1-12-0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_rate_and_quantity() {
        let mut no_rate = row("1-10-0", "1", "10", "0");
        no_rate.taxa_deprec_anos = None;
        let err = Ledger::from_rows(vec![no_rate]).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "taxa_deprec_anos"));

        let mut no_qty = row("1-10-0", "1", "10", "0");
        no_qty.qtde = None;
        let err = Ledger::from_rows(vec![no_qty]).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "qtde"));
    }

    #[test]
    fn test_missing_identifier_component_is_schema_error() {
        let mut no_tag = row("1-10-0", "1", "10", "0");
        no_tag.tag = None;
        let err = Ledger::from_rows(vec![no_tag]).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "plaqueta"));

        let mut no_type = row("1-10-0", "1", "10", "0");
        no_type.asset_type = Some(" ".to_string());
        let err = Ledger::from_rows(vec![no_type]).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "tipo"));
    }

    #[test]
    fn test_tariff_cycle_must_be_whole() {
        let mut whole = row("1-10-0", "1", "10", "0");
        whole.rtp = Some(4.0);
        assert_eq!(Ledger::from_rows(vec![whole]).unwrap().tariff_review_cycle(), 4);

        for bad in [4.5, -1.0, f64::NAN] {
            let mut r = row("1-10-0", "1", "10", "0");
            r.rtp = Some(bad);
            let err = Ledger::from_rows(vec![r]).unwrap_err();
            assert!(matches!(err, BrrError::InvalidValue { ref field, .. } if field == "rtp"));
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut bad = row("1-10-0", "1", "10", "0");
        bad.taxa_deprec_anos = Some(-5.0);
        assert!(matches!(
            Ledger::from_rows(vec![bad]),
            Err(BrrError::Schema { .. })
        ));
    }

    #[test]
    fn test_from_records_rechecks_identifiers() {
        let ledger = Ledger::from_rows(vec![row("1-10-0", "1", "10", "0")]).unwrap();
        let mut assets = ledger.assets().to_vec();
        assets.push(assets[0].clone());
        assert!(matches!(
            Ledger::from_records(assets),
            Err(BrrError::DuplicateIdentifier { .. })
        ));
    }
}

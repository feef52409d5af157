//! Load and normalize monthly price index series
//!
//! Statistics-office spreadsheets list the year only on the first month of
//! each block and name months by their Portuguese abbreviation. Rows are
//! normalized into `(last day of month, value)` points.

use csv::Reader;
use log::info;
use serde::Deserialize;
use std::path::Path;

use super::{InterpolatedIndex, PriceIndexPoint};
use crate::dates::last_day_of_month;
use crate::error::{BrrError, BrrResult};

const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Raw index row: year (possibly blank), month label and index number
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRow {
    #[serde(alias = "Ano")]
    pub ano: Option<i32>,
    #[serde(alias = "Mês", alias = "mês")]
    pub mes: String,
    #[serde(alias = "Índice", alias = "índice")]
    pub indice: f64,
}

/// Month number for a label such as `JAN`, `dez` or `7`
pub fn parse_month(label: &str) -> Option<u32> {
    let label = label.trim();
    if let Ok(n) = label.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let upper = label.to_uppercase();
    MONTH_LABELS
        .iter()
        .position(|m| *m == upper)
        .map(|i| i as u32 + 1)
}

/// Turn raw rows into index points, forward-filling blank years
pub fn normalize_index_rows(rows: &[IndexRow]) -> BrrResult<Vec<PriceIndexPoint>> {
    let mut current_year: Option<i32> = None;
    let mut points = Vec::with_capacity(rows.len());

    for row in rows {
        if row.ano.is_some() {
            current_year = row.ano;
        }
        let year = current_year.ok_or_else(|| BrrError::InvalidSeries {
            reason: format!("month '{}' appears before any year", row.mes),
        })?;
        let month = parse_month(&row.mes).ok_or_else(|| BrrError::InvalidValue {
            field: "mes".to_string(),
            value: row.mes.clone(),
        })?;
        let date = last_day_of_month(year, month).ok_or_else(|| BrrError::InvalidValue {
            field: "ano".to_string(),
            value: year.to_string(),
        })?;
        points.push(PriceIndexPoint::new(date, row.indice));
    }

    Ok(points)
}

/// Load an index series from any reader (columns `ano,mes,indice`)
pub fn load_index_from_reader<R: std::io::Read>(reader: R) -> BrrResult<InterpolatedIndex> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: IndexRow = result?;
        rows.push(row);
    }
    InterpolatedIndex::build(normalize_index_rows(&rows)?)
}

/// Load an index series from a CSV file
pub fn load_index<P: AsRef<Path>>(path: P) -> BrrResult<InterpolatedIndex> {
    let path = path.as_ref();
    info!("Loading price index from {}", path.display());
    let file = std::fs::File::open(path)?;
    let index = load_index_from_reader(file)?;
    info!(
        "Price index covers {} to {} ({} points)",
        index.first_date(),
        index.last_date(),
        index.points().len()
    );
    Ok(index)
}

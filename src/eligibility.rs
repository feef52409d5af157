//! Eligibility changes recorded after immobilization
//!
//! An asset that turns ineligible stops consuming useful life on the date of
//! the change. The register resolves, for an evaluation date, the date the
//! depreciation clock reads and the eligibility in force.

use chrono::NaiveDate;
use csv::Reader;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::dates::parse_date;
use crate::error::BrrResult;
use crate::ledger::loader::check_headers;
use crate::ledger::Eligibility;

/// Change of an asset's eligibility on a given date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityEvent {
    pub iu: String,
    pub date: NaiveDate,
    pub status: Eligibility,
}

/// Clock date and eligibility in force for one asset at one evaluation date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockResolution {
    pub clock_date: NaiveDate,
    pub eligibility: Eligibility,
}

/// Eligibility events grouped by asset
#[derive(Debug, Clone, Default)]
pub struct EligibilityRegister {
    events: HashMap<String, Vec<EligibilityEvent>>,
}

impl EligibilityRegister {
    pub fn build(events: Vec<EligibilityEvent>) -> Self {
        let mut grouped: HashMap<String, Vec<EligibilityEvent>> = HashMap::new();
        for event in events {
            grouped.entry(event.iu.clone()).or_default().push(event);
        }
        // Stable sort keeps input order for same-day events
        for list in grouped.values_mut() {
            list.sort_by_key(|e| e.date);
        }
        Self { events: grouped }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Events recorded for one asset, in date order
    pub fn events_for(&self, iu: &str) -> &[EligibilityEvent] {
        self.events.get(iu).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Event governing `iu` at `evaluation_date`: the latest ineligibility
    /// dated strictly before the evaluation date, provided the asset is
    /// already immobilized. Eligible events never unfreeze a clock.
    pub fn governing_event(
        &self,
        iu: &str,
        evaluation_date: NaiveDate,
        immobilized: &HashSet<&str>,
    ) -> Option<&EligibilityEvent> {
        if !immobilized.contains(iu) {
            return None;
        }
        self.events_for(iu)
            .iter()
            .filter(|e| e.date < evaluation_date && e.status == Eligibility::Ineligible)
            .last()
    }

    /// Resolve the depreciation clock for one asset.
    ///
    /// A governing ineligibility freezes the clock on its date. Without one
    /// the clock reads the evaluation date with the ledger's eligibility.
    pub fn resolve(
        &self,
        iu: &str,
        evaluation_date: NaiveDate,
        immobilized: &HashSet<&str>,
        ledger_eligibility: Eligibility,
    ) -> ClockResolution {
        match self.governing_event(iu, evaluation_date, immobilized) {
            Some(event) => ClockResolution {
                clock_date: event.date,
                eligibility: Eligibility::Ineligible,
            },
            None => ClockResolution {
                clock_date: evaluation_date,
                eligibility: ledger_eligibility,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    iu: String,
    data: String,
    elegibilidade: String,
}

/// Load eligibility events from any reader (columns `iu,data,elegibilidade`)
pub fn load_events_from_reader<R: std::io::Read>(reader: R) -> BrrResult<Vec<EligibilityEvent>> {
    let mut csv_reader = Reader::from_reader(reader);
    check_headers(csv_reader.headers()?, &["iu", "data", "elegibilidade"])?;

    let mut events = Vec::new();
    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        events.push(EligibilityEvent {
            iu: row.iu.trim().to_string(),
            date: parse_date(&row.data)?,
            status: row.elegibilidade.parse()?,
        });
    }
    Ok(events)
}

/// Load an eligibility register from a CSV file
pub fn load_register<P: AsRef<Path>>(path: P) -> BrrResult<EligibilityRegister> {
    let path = path.as_ref();
    let events = load_events_from_reader(std::fs::File::open(path)?)?;
    info!("Loaded {} eligibility events from {}", events.len(), path.display());
    Ok(EligibilityRegister::build(events))
}

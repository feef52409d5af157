//! Cash-flow reconciliation of a movement
//!
//! The regulatory base is read as a loan financed at the remuneration rate:
//! investments are disbursements, and each period repays depreciation plus
//! interest on the prior net base. The IRR of that flow must return the
//! financing rate.

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::irr::IrrSolver;
use super::snapshot::PeriodSnapshot;
use crate::dates::add_one_year;
use crate::error::BrrResult;

/// Maximum relative deviation between IRR and financing rate for a pass
pub const IRR_TOLERANCE: f64 = 1e-5;

/// One period of the reconciliation cash flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowLine {
    pub date: NaiveDate,
    /// Negated period investment
    pub investment: f64,
    /// Depreciation quota (QRR); the full net base on the terminal line
    pub amortization: f64,
    /// Prior net base times the financing rate
    pub interest: f64,
    /// Net base at the end of the period
    pub balance: f64,
    pub flow: f64,
}

impl CashFlowLine {
    fn new(date: NaiveDate, investment: f64, amortization: f64, interest: f64, balance: f64) -> Self {
        Self {
            date,
            investment,
            amortization,
            interest,
            balance,
            flow: investment + amortization + interest,
        }
    }
}

/// Cash flow for a snapshot series, including the terminal settlement line
/// one year after the last checkpoint. Not truncated.
pub fn build_cash_flow(snapshots: &[PeriodSnapshot], financing_rate: f64) -> Vec<CashFlowLine> {
    let mut lines = Vec::with_capacity(snapshots.len() + 1);
    let mut prior_net = None;
    for snap in snapshots {
        let interest = prior_net.map_or(0.0, |net: f64| net * financing_rate);
        lines.push(CashFlowLine::new(
            snap.evaluation_date,
            -snap.period_investment,
            snap.qrr,
            interest,
            snap.net_brr,
        ));
        prior_net = Some(snap.net_brr);
    }

    if let Some(last) = snapshots.last() {
        lines.push(CashFlowLine::new(
            add_one_year(last.evaluation_date),
            0.0,
            last.net_brr,
            last.net_brr * financing_rate,
            0.0,
        ));
    }
    lines
}

/// Lines before the first zero flow
pub fn truncate_at_zero_flow(lines: &[CashFlowLine]) -> &[CashFlowLine] {
    let end = lines.iter().position(|l| l.flow == 0.0).unwrap_or(lines.len());
    &lines[..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Lines the IRR was solved over (truncated at the first zero flow)
    pub lines: Vec<CashFlowLine>,
    /// Lines dropped by the truncation
    pub dropped_lines: usize,
    pub irr: f64,
    pub financing_rate: f64,
    /// `(irr - r) / r`; the plain difference when `r` is zero
    pub deviation: f64,
    pub verdict: Verdict,
}

impl Reconciliation {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Build, truncate and solve the cash flow, then compare its IRR with the
/// financing rate
pub fn reconcile(
    snapshots: &[PeriodSnapshot],
    financing_rate: f64,
    solver: &dyn IrrSolver,
) -> BrrResult<Reconciliation> {
    let full = build_cash_flow(snapshots, financing_rate);
    let lines = truncate_at_zero_flow(&full).to_vec();
    let dropped_lines = full.len() - lines.len();
    if dropped_lines > 0 {
        warn!(
            "Cash flow truncated at a zero flow: {} of {} lines kept",
            lines.len(),
            full.len()
        );
    }

    let flows: Vec<f64> = lines.iter().map(|l| l.flow).collect();
    let irr = solver.solve_irr(&flows)?;

    let deviation = if financing_rate == 0.0 {
        irr - financing_rate
    } else {
        (irr - financing_rate) / financing_rate
    };
    let verdict = if deviation.abs() < IRR_TOLERANCE {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    match verdict {
        Verdict::Pass => info!(
            "Reconciliation PASS: IRR {:.6}% vs financing rate {:.6}%",
            irr * 100.0,
            financing_rate * 100.0
        ),
        Verdict::Fail => warn!(
            "Reconciliation FAIL: IRR {:.6}% vs financing rate {:.6}% (deviation {:.6}%)",
            irr * 100.0,
            financing_rate * 100.0,
            deviation * 100.0
        ),
    }

    Ok(Reconciliation {
        lines,
        dropped_lines,
        irr,
        financing_rate,
        deviation,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::irr::PolynomialSolver;
    use approx::assert_relative_eq;

    const R: f64 = 0.1182768;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn snap(date: NaiveDate, investment: f64, qrr: f64, net: f64) -> PeriodSnapshot {
        PeriodSnapshot {
            evaluation_date: date,
            monetary_reference_date: date,
            period_investment: investment,
            gross_brr: net,
            net_brr: net,
            accumulated_depreciation: 0.0,
            ineligible_gross: 0.0,
            ineligible_net: 0.0,
            qrr,
            tdr: 0.0,
            balance: net,
        }
    }

    #[test]
    fn test_lines_and_terminal_settlement() {
        let snaps = vec![
            snap(d(2021, 12, 31), 1000.0, 0.0, 1000.0),
            snap(d(2022, 12, 31), 200.0, 100.0, 1100.0),
        ];
        let lines = build_cash_flow(&snaps, R);
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].interest, 0.0);
        assert_eq!(lines[0].flow, -1000.0);

        assert_relative_eq!(lines[1].interest, 1000.0 * R);
        assert_relative_eq!(lines[1].flow, -200.0 + 100.0 + 1000.0 * R);

        assert_eq!(lines[2].date, d(2023, 12, 31));
        assert_eq!(lines[2].investment, 0.0);
        assert_eq!(lines[2].amortization, 1100.0);
        assert_relative_eq!(lines[2].interest, 1100.0 * R);
        assert_eq!(lines[2].balance, 0.0);
    }

    #[test]
    fn test_consistent_movement_passes() {
        let snaps = vec![
            snap(d(2020, 12, 31), 1000.0, 0.0, 1000.0),
            snap(d(2021, 12, 31), 500.0, 250.0, 1250.0),
            snap(d(2022, 12, 31), 0.0, 400.0, 850.0),
        ];
        let rec = reconcile(&snaps, R, &PolynomialSolver::default()).unwrap();
        assert_eq!(rec.dropped_lines, 0);
        assert_eq!(rec.lines.len(), 4);
        assert_relative_eq!(rec.irr, R, epsilon = 1e-9);
        assert_eq!(rec.verdict, Verdict::Pass);
        assert!(rec.passed());
    }

    #[test]
    fn test_inconsistent_movement_fails() {
        // Depreciation quota not reflected in the net base
        let snaps = vec![
            snap(d(2020, 12, 31), 1000.0, 0.0, 1000.0),
            snap(d(2021, 12, 31), 0.0, 300.0, 1000.0),
        ];
        let rec = reconcile(&snaps, R, &PolynomialSolver::default()).unwrap();
        assert_eq!(rec.verdict, Verdict::Fail);
        assert!(rec.deviation > 0.0);
    }

    #[test]
    fn test_zero_flow_truncates() {
        let snaps = vec![
            snap(d(2020, 12, 31), 1000.0, 0.0, 1000.0),
            snap(d(2021, 12, 31), 0.0, 500.0, 500.0),
            snap(d(2022, 12, 31), 0.0, 500.0, 0.0),
            snap(d(2023, 12, 31), 0.0, 0.0, 0.0),
            snap(d(2024, 6, 30), 0.0, 0.0, 0.0),
        ];
        let full = build_cash_flow(&snaps, R);
        assert_eq!(full[3].flow, 0.0);
        assert_eq!(truncate_at_zero_flow(&full).len(), 3);

        let rec = reconcile(&snaps, R, &PolynomialSolver::default()).unwrap();
        assert_eq!(rec.lines.len(), 3);
        assert_eq!(rec.dropped_lines, 3);
        assert_relative_eq!(rec.irr, R, epsilon = 1e-9);
        assert!(rec.passed());
    }

    #[test]
    fn test_verdict_labels() {
        assert_eq!(Verdict::Pass.to_string(), "PASS");
        assert_eq!(serde_json::to_string(&Verdict::Fail).unwrap(), "\"FAIL\"");
    }
}

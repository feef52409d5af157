//! Internal Rate of Return (IRR) of a reconciliation cash flow
//!
//! A flow series `c_0..c_n` has NPV `sum(c_t * x^t)` with `x = 1 / (1 + r)`,
//! so every rate above -100% is a positive real root of that polynomial.
//! When several roots exist the rate closest to zero is reported.

use crate::error::{BrrError, BrrResult};

/// Solves the periodic IRR of a cash flow series
pub trait IrrSolver: Send + Sync {
    fn solve_irr(&self, cash_flows: &[f64]) -> BrrResult<f64>;
}

/// NPV of the flows at a periodic rate
pub fn npv_at_rate(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// NPV polynomial evaluated at discount factor `x` (Horner)
fn npv_at_discount(cash_flows: &[f64], x: f64) -> f64 {
    cash_flows.iter().rev().fold(0.0, |acc, &cf| acc * x + cf)
}

/// Root search over the discount factor.
///
/// Positive roots are bracketed on a log-spaced grid between the Cauchy
/// bounds of the polynomial and refined by bisection. Roots of even
/// multiplicity (no sign change) are not found.
#[derive(Debug, Clone, Copy)]
pub struct PolynomialSolver {
    pub grid_points: usize,
    pub max_iterations: usize,
}

const DEFAULT_GRID_POINTS: usize = 20_000;
const DEFAULT_MAX_ITERATIONS: usize = 200;

impl Default for PolynomialSolver {
    fn default() -> Self {
        Self {
            grid_points: DEFAULT_GRID_POINTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PolynomialSolver {
    /// Interval that contains every positive root, or `None` when the
    /// polynomial has fewer than two non-zero coefficients
    fn root_bounds(cash_flows: &[f64]) -> Option<(f64, f64)> {
        let low_idx = cash_flows.iter().position(|&c| c != 0.0)?;
        let high_idx = cash_flows.iter().rposition(|&c| c != 0.0)?;
        if low_idx == high_idx {
            return None;
        }
        let lead = cash_flows[high_idx].abs();
        let tail = cash_flows[low_idx].abs();
        let upper = 1.0
            + cash_flows[low_idx..high_idx]
                .iter()
                .map(|c| c.abs() / lead)
                .fold(0.0, f64::max);
        let lower = 1.0
            / (1.0
                + cash_flows[low_idx + 1..=high_idx]
                    .iter()
                    .map(|c| c.abs() / tail)
                    .fold(0.0, f64::max));
        Some((lower, upper))
    }

    fn bisect(&self, cash_flows: &[f64], mut low: f64, mut high: f64) -> f64 {
        let mut f_low = npv_at_discount(cash_flows, low);
        for _ in 0..self.max_iterations {
            let mid = (low + high) / 2.0;
            let f_mid = npv_at_discount(cash_flows, mid);
            if f_mid == 0.0 || (high - low) <= f64::EPSILON * mid {
                return mid;
            }
            if f_mid.signum() == f_low.signum() {
                low = mid;
                f_low = f_mid;
            } else {
                high = mid;
            }
        }
        (low + high) / 2.0
    }

    /// Every positive discount-factor root found
    pub fn discount_roots(&self, cash_flows: &[f64]) -> Vec<f64> {
        let Some((lower, upper)) = Self::root_bounds(cash_flows) else {
            return Vec::new();
        };
        let steps = self.grid_points.max(2);
        let step = (upper / lower).ln() / steps as f64;

        let mut roots = Vec::new();
        let mut prev_x = lower;
        let mut prev_f = npv_at_discount(cash_flows, prev_x);
        if prev_f == 0.0 {
            roots.push(prev_x);
        }
        for i in 1..=steps {
            let x = lower * (step * i as f64).exp();
            let f = npv_at_discount(cash_flows, x);
            if f == 0.0 {
                roots.push(x);
            } else if prev_f != 0.0 && f.signum() != prev_f.signum() {
                roots.push(self.bisect(cash_flows, prev_x, x));
            }
            prev_x = x;
            prev_f = f;
        }
        roots
    }
}

impl IrrSolver for PolynomialSolver {
    fn solve_irr(&self, cash_flows: &[f64]) -> BrrResult<f64> {
        self.discount_roots(cash_flows)
            .into_iter()
            .map(|x| 1.0 / x - 1.0)
            .filter(|r| r.is_finite())
            .min_by(|a, b| a.abs().total_cmp(&b.abs()))
            .ok_or(BrrError::NoValidRoot {
                periods: cash_flows.len(),
            })
    }
}

/// Newton-Raphson from an initial guess with a bisection fallback.
///
/// Converges to the root nearest the guess, which is not necessarily the
/// root closest to zero when the flows have several.
#[derive(Debug, Clone, Copy)]
pub struct NewtonSolver {
    pub guess: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self {
            guess: 0.1,
            tolerance: 1e-12,
            max_iterations: 1000,
        }
    }
}

/// NPV and its derivative with respect to rate
fn npv_and_derivative(cash_flows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;
    for (t, &cf) in cash_flows.iter().enumerate() {
        npv += cf / (1.0 + rate).powi(t as i32);
        if t > 0 {
            dnpv -= (t as f64) * cf / (1.0 + rate).powi(t as i32 + 1);
        }
    }
    (npv, dnpv)
}

impl NewtonSolver {
    fn bisection(&self, cash_flows: &[f64]) -> BrrResult<f64> {
        let mut low = -0.99_f64;
        let mut high = 10.0_f64;
        let no_root = BrrError::NoValidRoot {
            periods: cash_flows.len(),
        };

        if npv_at_rate(cash_flows, low) * npv_at_rate(cash_flows, high) > 0.0 {
            return Err(no_root);
        }
        for _ in 0..self.max_iterations {
            let mid = (low + high) / 2.0;
            let npv_mid = npv_at_rate(cash_flows, mid);
            if npv_mid.abs() < self.tolerance || (high - low) / 2.0 < self.tolerance {
                return Ok(mid);
            }
            if npv_mid * npv_at_rate(cash_flows, low) < 0.0 {
                high = mid;
            } else {
                low = mid;
            }
        }
        Err(no_root)
    }
}

impl IrrSolver for NewtonSolver {
    fn solve_irr(&self, cash_flows: &[f64]) -> BrrResult<f64> {
        let has_positive = cash_flows.iter().any(|&cf| cf > 0.0);
        let has_negative = cash_flows.iter().any(|&cf| cf < 0.0);
        if !has_positive || !has_negative {
            return Err(BrrError::NoValidRoot {
                periods: cash_flows.len(),
            });
        }

        let mut rate = self.guess;
        for _ in 0..self.max_iterations {
            let (npv, dnpv) = npv_and_derivative(cash_flows, rate);
            if dnpv.abs() < 1e-20 {
                return self.bisection(cash_flows);
            }
            let new_rate = (rate - npv / dnpv).clamp(-0.99, 10.0);
            if (new_rate - rate).abs() < self.tolerance {
                return Ok(new_rate);
            }
            rate = new_rate;
        }
        self.bisection(cash_flows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_period() {
        let irr = PolynomialSolver::default().solve_irr(&[-1000.0, 1100.0]).unwrap();
        assert_relative_eq!(irr, 0.10, epsilon = 1e-10);
    }

    #[test]
    fn test_negative_discount_roots_ignored() {
        // Roots at x = +-1/1.1; only the positive one is a rate above -100%
        let irr = PolynomialSolver::default()
            .solve_irr(&[-1000.0, 0.0, 1210.0])
            .unwrap();
        assert_relative_eq!(irr, 0.10, epsilon = 1e-10);
    }

    #[test]
    fn test_picks_rate_closest_to_zero() {
        // NPV vanishes at 10% and at 20%
        let flows = [-100.0, 230.0, -132.0];
        let solver = PolynomialSolver::default();
        assert_eq!(solver.discount_roots(&flows).len(), 2);
        assert_relative_eq!(solver.solve_irr(&flows).unwrap(), 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_no_sign_change_has_no_root() {
        let err = PolynomialSolver::default().solve_irr(&[100.0, 100.0]).unwrap_err();
        assert!(matches!(err, BrrError::NoValidRoot { periods: 2 }));
        assert!(PolynomialSolver::default().solve_irr(&[0.0, 0.0]).is_err());
        assert!(NewtonSolver::default().solve_irr(&[100.0, 100.0]).is_err());
    }

    #[test]
    fn test_amortizing_balance_returns_financing_rate() {
        // Balance of 1000 repaid over 3 periods with interest at 11.82768%
        let r = 0.1182768;
        let balances = [1000.0, 700.0, 300.0, 0.0];
        let mut flows = vec![-balances[0]];
        for t in 1..balances.len() {
            flows.push(balances[t - 1] * (1.0 + r) - balances[t]);
        }

        assert_relative_eq!(
            PolynomialSolver::default().solve_irr(&flows).unwrap(),
            r,
            epsilon = 1e-9
        );
        assert_relative_eq!(NewtonSolver::default().solve_irr(&flows).unwrap(), r, epsilon = 1e-9);
        assert!(npv_at_rate(&flows, r).abs() < 1e-9);
    }
}

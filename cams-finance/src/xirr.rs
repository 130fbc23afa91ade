//! NPV root finding over a dated cash-flow schedule.
//!
//! Convention: `NPV(rate) = Σ amount_i / (1+rate)^((date_i - date_0)/365)`,
//! anchored at the first flow's date, 365-day year. Purchases are positive,
//! money returned to the investor negative, and the schedule ends with one
//! synthetic valuation flow of `-market_value` at the closing date, so the
//! root is the annualised rate the holding actually earned.

use chrono::NaiveDate;
use thiserror::Error;

pub const DAYS_PER_YEAR: f64 = 365.0;

const NEWTON_MAX_ITER: usize = 100;
const NEWTON_TOL: f64 = 1e-7;
const BISECT_MAX_ITER: usize = 300;
const BISECT_LO: f64 = -1.0;
const BISECT_HI: f64 = 1e10;

/// One dated cash flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Both solver stages exhausted without finding a root.
#[derive(Debug, Error)]
#[error("rate solver failed to converge (newton and bisection stages)")]
pub struct ConvergenceError;

/// Net present value of the schedule at `rate`.
///
/// `rate <= -1.0` is a total-loss singularity; it returns +infinity so the
/// objective stays well-defined and solvers are steered away from it.
pub fn npv(rate: f64, flows: &[CashFlow]) -> f64 {
    if rate <= -1.0 {
        return f64::INFINITY;
    }
    let Some(anchor) = flows.first() else {
        return 0.0;
    };
    flows
        .iter()
        .map(|cf| {
            let years = (cf.date - anchor.date).num_days() as f64 / DAYS_PER_YEAR;
            cf.amount / (1.0 + rate).powf(years)
        })
        .sum()
}

fn npv_derivative(rate: f64, flows: &[CashFlow]) -> f64 {
    let Some(anchor) = flows.first() else {
        return 0.0;
    };
    flows
        .iter()
        .map(|cf| {
            let years = (cf.date - anchor.date).num_days() as f64 / DAYS_PER_YEAR;
            -years * cf.amount / (1.0 + rate).powf(years + 1.0)
        })
        .sum()
}

fn newton(flows: &[CashFlow]) -> Option<f64> {
    let mut rate = 0.0f64;
    for _ in 0..NEWTON_MAX_ITER {
        let f = npv(rate, flows);
        if !f.is_finite() {
            return None;
        }
        if f.abs() < NEWTON_TOL {
            return Some(rate);
        }
        let d = npv_derivative(rate, flows);
        if !d.is_finite() || d.abs() < 1e-12 {
            return None;
        }
        let next = rate - f / d;
        if !next.is_finite() || next <= BISECT_LO {
            return None;
        }
        if (next - rate).abs() < NEWTON_TOL {
            return Some(next);
        }
        rate = next;
    }
    None
}

fn bisect(flows: &[CashFlow]) -> Option<f64> {
    // Evaluate just inside the (-1, 1e10] bracket: at -1 the sentinel kicks
    // in, and immediately above it the latest (valuation) flow dominates.
    let mut lo = BISECT_LO + 1e-6;
    let mut hi = BISECT_HI;
    let mut f_lo = npv(lo, flows);
    let f_hi = npv(hi, flows);
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo * f_hi > 0.0 {
        return None;
    }
    let mut mid = lo;
    for _ in 0..BISECT_MAX_ITER {
        mid = (lo + hi) / 2.0;
        let f = npv(mid, flows);
        if f.is_finite() && f.abs() < NEWTON_TOL {
            return Some(mid);
        }
        if f_lo * f > 0.0 {
            lo = mid;
            f_lo = f;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 {
            break;
        }
    }
    // accept the bracket midpoint if it is a genuine near-root
    let f = npv(mid, flows);
    (f.is_finite() && f.abs() < 1e-3).then_some(mid)
}

/// Find the rate that zeroes the schedule's NPV.
///
/// Newton-Raphson from `rate = 0` with a bounded iteration budget, falling
/// back to bisection over `(-1, 1e10]`. Returns a fraction; callers present
/// `rate * 100` rounded to two decimals. Never substitutes a default rate.
pub fn solve_rate(flows: &[CashFlow]) -> Result<f64, ConvergenceError> {
    newton(flows).or_else(|| bisect(flows)).ok_or(ConvergenceError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flow(y: i32, m: u32, day: u32, amount: f64) -> CashFlow {
        CashFlow { date: d(y, m, day), amount }
    }

    #[test]
    fn test_one_year_single_period() {
        // 1000 in, liquidated at 1200 exactly 365 days later: 20%
        let flows = [flow(2023, 1, 1, 1000.0), flow(2024, 1, 1, -1200.0)];
        let rate = solve_rate(&flows).unwrap();
        assert!((rate - 0.20).abs() < 1e-4, "rate = {rate}");
    }

    #[test]
    fn test_root_zeroes_npv() {
        let flows = [
            flow(2022, 1, 1, 1000.0),
            flow(2022, 7, 1, 500.0),
            flow(2023, 3, 15, -200.0),
            flow(2024, 1, 1, -1700.0),
        ];
        let rate = solve_rate(&flows).unwrap();
        assert!(npv(rate, &flows).abs() < 1e-4);
    }

    #[test]
    fn test_negative_return() {
        let flows = [flow(2023, 1, 1, 1000.0), flow(2024, 1, 1, -900.0)];
        let rate = solve_rate(&flows).unwrap();
        assert!((rate - (-0.10)).abs() < 1e-4, "rate = {rate}");
    }

    #[test]
    fn test_total_loss_boundary_is_infinite() {
        let flows = [flow(2023, 1, 1, 1000.0), flow(2024, 1, 1, -0.01)];
        assert!(npv(-1.0, &flows).is_infinite());
        assert!(npv(-1.5, &flows).is_infinite());
    }

    #[test]
    fn test_all_outflows_cannot_converge() {
        // no money ever comes back: npv positive everywhere
        let flows = [flow(2023, 1, 1, 1000.0), flow(2023, 6, 1, 500.0)];
        assert!(solve_rate(&flows).is_err());
    }

    #[test]
    fn test_bisection_finds_root_directly() {
        let flows = [flow(2023, 1, 1, 1000.0), flow(2024, 1, 1, -1200.0)];
        let rate = bisect(&flows).unwrap();
        assert!((rate - 0.20).abs() < 1e-3, "rate = {rate}");
    }

    #[test]
    fn test_empty_schedule_npv_is_zero() {
        assert_eq!(npv(0.1, &[]), 0.0);
    }
}

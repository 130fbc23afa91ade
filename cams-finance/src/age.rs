//! Investment horizon and effective closing date for a holding.

use chrono::NaiveDate;
use thiserror::Error;

use crate::xirr::CashFlow;

/// Below this many units a holding is treated as fully redeemed.
pub const FULLY_REDEEMED_EPSILON: f64 = 0.01;

/// A holding's resolved horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    pub age_days: i64,
    pub closing_date: NaiveDate,
}

#[derive(Debug, Error)]
#[error("empty cash-flow schedule")]
pub struct EmptySchedule;

/// Derive age and effective closing date from a chronologically sorted
/// schedule (real transactions plus one trailing synthetic valuation flow).
///
/// - only the synthetic point: opening-balance-only holding, age 0;
/// - fully redeemed (balance under [`FULLY_REDEEMED_EPSILON`]): the close is
///   the last real transaction, the second-to-last point, not the statement's
///   valuation date;
/// - otherwise: first to last point.
pub fn resolve_horizon(
    closing_balance: f64,
    flows: &[CashFlow],
) -> Result<Horizon, EmptySchedule> {
    let (first, last) = match flows {
        [] => return Err(EmptySchedule),
        [only] => {
            return Ok(Horizon {
                age_days: 0,
                closing_date: only.date,
            })
        }
        [first, .., last] => (first, last),
    };

    let closing_date = if closing_balance < FULLY_REDEEMED_EPSILON {
        flows[flows.len() - 2].date
    } else {
        last.date
    };
    Ok(Horizon {
        age_days: (closing_date - first.date).num_days(),
        closing_date,
    })
}

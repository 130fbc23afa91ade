//! Per-holding and portfolio return computation.
//!
//! Consumes the classifier's record sets grouped by (folio, fund) and fills
//! in the derived `xirr`/`age_days`/closing-date fields, then produces one
//! synthetic portfolio row over the union of all cash flows. The aggregate
//! runs strictly after the per-holding pass: it depends on the resolved
//! closing dates.

use thiserror::Error;
use tracing::debug;

use cams_ingest::{SummaryRecord, TransactionRecord};

use crate::age::{self, Horizon};
use crate::xirr::{solve_rate, CashFlow};

/// Below this horizon annualised math is noise; report the absolute gain.
pub const MIN_ANNUALIZED_AGE_DAYS: i64 = 365;

/// Marker Folio/Fund_name on the synthetic portfolio row.
pub const PORTFOLIO_FOLIO: &str = "Portfolio";
pub const PORTFOLIO_FUND_NAME: &str = "All holdings";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{folio} / {fund_name}: rate solver failed to converge")]
    Convergence { folio: String, fund_name: String },
    #[error("{folio} / {fund_name}: no cash flows to resolve a horizon from")]
    EmptySchedule { folio: String, fund_name: String },
    #[error("statement contains no closing summaries")]
    NoHoldings,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Sub-year horizons: simple gain ratio instead of an annualised rate.
fn absolute_gain(cost_value: f64, market_value: f64) -> f64 {
    if cost_value == 0.0 {
        0.0
    } else {
        (market_value - cost_value) / cost_value
    }
}

/// Pick the return strategy for a resolved horizon and run it.
fn holding_rate(
    flows: &[CashFlow],
    horizon: Horizon,
    cost_value: f64,
    market_value: f64,
    folio: &str,
    fund_name: &str,
) -> Result<f64, EngineError> {
    if horizon.age_days < MIN_ANNUALIZED_AGE_DAYS {
        debug!(folio, fund_name, age_days = horizon.age_days, "short horizon, absolute gain");
        return Ok(absolute_gain(cost_value, market_value));
    }
    solve_rate(flows).map_err(|_| EngineError::Convergence {
        folio: folio.to_string(),
        fund_name: fund_name.to_string(),
    })
}

fn sorted_flows_for(summary: &SummaryRecord, transactions: &[TransactionRecord]) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = transactions
        .iter()
        .filter(|t| t.folio == summary.folio && t.fund_name == summary.fund_name)
        .map(|t| CashFlow {
            date: t.date,
            amount: t.amount,
        })
        .collect();
    flows.sort_by_key(|f| f.date);
    flows
}

/// Fill the derived fields of every summary record and return the synthetic
/// portfolio aggregate row.
pub fn compute_returns(
    transactions: &[TransactionRecord],
    summaries: &mut [SummaryRecord],
) -> Result<SummaryRecord, EngineError> {
    if summaries.is_empty() {
        return Err(EngineError::NoHoldings);
    }

    let mut all_flows: Vec<CashFlow> = Vec::new();

    for summary in summaries.iter_mut() {
        let mut flows = sorted_flows_for(summary, transactions);
        all_flows.extend_from_slice(&flows);
        // liquidate the holding on paper at the statement's valuation date
        flows.push(CashFlow {
            date: summary.date,
            amount: -summary.market_value,
        });

        let horizon = age::resolve_horizon(summary.closing_unit_balance, &flows).map_err(|_| {
            EngineError::EmptySchedule {
                folio: summary.folio.clone(),
                fund_name: summary.fund_name.clone(),
            }
        })?;
        let rate = holding_rate(
            &flows,
            horizon,
            summary.total_cost_value,
            summary.market_value,
            &summary.folio,
            &summary.fund_name,
        )?;

        summary.xirr = round2(rate * 100.0);
        summary.age_days = horizon.age_days;
        summary.date = horizon.closing_date;
    }

    // Portfolio aggregate, strictly after the per-holding pass.
    let total_balance: f64 = summaries.iter().map(|s| s.closing_unit_balance).sum();
    let total_cost: f64 = summaries.iter().map(|s| s.total_cost_value).sum();
    let total_market: f64 = summaries.iter().map(|s| s.market_value).sum();
    let latest_close = summaries
        .iter()
        .map(|s| s.date)
        .max()
        .ok_or(EngineError::NoHoldings)?;

    all_flows.sort_by_key(|f| f.date);
    all_flows.push(CashFlow {
        date: latest_close,
        amount: -total_market,
    });

    let horizon = age::resolve_horizon(total_balance, &all_flows).map_err(|_| {
        EngineError::EmptySchedule {
            folio: PORTFOLIO_FOLIO.to_string(),
            fund_name: PORTFOLIO_FUND_NAME.to_string(),
        }
    })?;
    let rate = holding_rate(
        &all_flows,
        horizon,
        total_cost,
        total_market,
        PORTFOLIO_FOLIO,
        PORTFOLIO_FUND_NAME,
    )?;

    Ok(SummaryRecord {
        folio: PORTFOLIO_FOLIO.to_string(),
        fund_name: PORTFOLIO_FUND_NAME.to_string(),
        date: horizon.closing_date,
        closing_unit_balance: total_balance,
        nav: if total_balance > 0.0 {
            total_market / total_balance
        } else {
            0.0
        },
        total_cost_value: total_cost,
        market_value: total_market,
        xirr: round2(rate * 100.0),
        age_days: horizon.age_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(folio: &str, fund: &str, date: NaiveDate, amount: f64) -> TransactionRecord {
        TransactionRecord {
            folio: folio.to_string(),
            fund_name: fund.to_string(),
            date,
            description: "Purchase".to_string(),
            amount,
            units: 0.0,
            price: 0.0,
            unit_balance: 0.0,
        }
    }

    fn summary(
        folio: &str,
        fund: &str,
        date: NaiveDate,
        balance: f64,
        cost: f64,
        market: f64,
    ) -> SummaryRecord {
        SummaryRecord {
            folio: folio.to_string(),
            fund_name: fund.to_string(),
            date,
            closing_unit_balance: balance,
            nav: 0.0,
            total_cost_value: cost,
            market_value: market,
            xirr: 0.0,
            age_days: 0,
        }
    }

    #[test]
    fn test_one_shot_holding_held_a_year() {
        let txns = vec![txn("1", "F", d(2023, 1, 1), 1000.0)];
        let mut sums = vec![summary("1", "F", d(2024, 1, 1), 10.0, 1000.0, 1200.0)];
        let agg = compute_returns(&txns, &mut sums).unwrap();

        assert_eq!(sums[0].age_days, 365);
        assert!((sums[0].xirr - 20.0).abs() < 0.02, "xirr = {}", sums[0].xirr);
        // single holding: the aggregate row mirrors it
        assert_eq!(agg.folio, PORTFOLIO_FOLIO);
        assert_eq!(agg.xirr, sums[0].xirr);
        assert_eq!(agg.market_value, 1200.0);
        assert!((agg.nav - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_horizon_uses_absolute_gain() {
        let txns = vec![txn("1", "F", d(2023, 6, 1), 1000.0)];
        let mut sums = vec![summary("1", "F", d(2023, 12, 31), 10.0, 1000.0, 1100.0)];
        compute_returns(&txns, &mut sums).unwrap();

        assert!(sums[0].age_days < MIN_ANNUALIZED_AGE_DAYS);
        // exactly (1100 - 1000) / 1000, not annualised
        assert_eq!(sums[0].xirr, 10.0);
    }

    #[test]
    fn test_short_horizon_zero_cost_reports_zero() {
        let txns = vec![txn("1", "F", d(2023, 6, 1), 0.0)];
        let mut sums = vec![summary("1", "F", d(2023, 12, 31), 10.0, 0.0, 1100.0)];
        compute_returns(&txns, &mut sums).unwrap();
        assert_eq!(sums[0].xirr, 0.0);
    }

    #[test]
    fn test_redeemed_holding_closing_date_moves_back() {
        let txns = vec![
            txn("1", "F", d(2022, 1, 1), 1000.0),
            txn("1", "F", d(2023, 6, 15), -1150.0),
        ];
        let mut sums = vec![summary("1", "F", d(2023, 12, 31), 0.0, 1000.0, 0.0)];
        compute_returns(&txns, &mut sums).unwrap();

        assert_eq!(sums[0].date, d(2023, 6, 15));
        assert_eq!(sums[0].age_days, 530);
        assert!(sums[0].xirr > 0.0);
    }

    #[test]
    fn test_opening_balance_only_holding() {
        // no transactions inside the statement window
        let mut sums = vec![summary("1", "F", d(2023, 12, 31), 50.0, 4000.0, 5000.0)];
        compute_returns(&[], &mut sums).unwrap();

        assert_eq!(sums[0].age_days, 0);
        // age 0 < 365: absolute gain (5000 - 4000) / 4000
        assert_eq!(sums[0].xirr, 25.0);
    }

    #[test]
    fn test_portfolio_runs_over_union_of_flows() {
        let txns = vec![
            txn("1", "A", d(2022, 1, 1), 1000.0),
            txn("2", "B", d(2022, 1, 1), 1000.0),
        ];
        let mut sums = vec![
            summary("1", "A", d(2024, 1, 1), 10.0, 1000.0, 1440.0),
            summary("2", "B", d(2024, 1, 1), 10.0, 1000.0, 1000.0),
        ];
        let agg = compute_returns(&txns, &mut sums).unwrap();

        assert_eq!(agg.total_cost_value, 2000.0);
        assert_eq!(agg.market_value, 2440.0);
        assert_eq!(agg.age_days, 730);
        // blended: 2000 -> 2440 over two years, ~10.45% annualised
        assert!(agg.xirr > sums[1].xirr && agg.xirr < sums[0].xirr);
        assert!((agg.xirr - 10.45).abs() < 0.1, "xirr = {}", agg.xirr);
    }

    #[test]
    fn test_no_holdings_is_an_error() {
        let mut sums: Vec<SummaryRecord> = vec![];
        assert!(matches!(
            compute_returns(&[], &mut sums),
            Err(EngineError::NoHoldings)
        ));
    }
}

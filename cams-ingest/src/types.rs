use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ledger entry for a fund holding, as it appears on the statement.
///
/// Document order within a fund is generally chronological but not guaranteed;
/// sort by `date` before any financial computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub folio: String,
    pub fund_name: String,
    pub date: NaiveDate,
    pub description: String,
    /// Signed: purchases positive, redemptions/payouts negative
    /// (parenthesised in the source text).
    pub amount: f64,
    pub units: f64,
    pub price: f64,
    pub unit_balance: f64,
}

/// Point-in-time closing snapshot for one (folio, fund) holding.
///
/// Two-phase lifecycle: the structural fields are filled at parse time;
/// `xirr` and `age_days` keep their zero placeholders until the return
/// engine fills them, and `date` may be moved back for fully redeemed
/// holdings at the same point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub folio: String,
    pub fund_name: String,
    /// Market valuation date from the statement, later overwritten with the
    /// resolved closing date.
    pub date: NaiveDate,
    pub closing_unit_balance: f64,
    pub nav: f64,
    pub total_cost_value: f64,
    pub market_value: f64,
    /// Annualised (or short-horizon absolute) return in percent, 2 dp.
    pub xirr: f64,
    /// Investment horizon in days.
    pub age_days: i64,
}

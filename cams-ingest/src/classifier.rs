//! CAMS consolidated-account-statement line classifier.
//!
//! Single forward pass over the extracted text. Expected line shapes:
//!   ABC Flexi Cap Fund - Direct Growth - ISIN: INF000AB1CD2
//!   Folio No: 123456 / 78
//!   01-Jan-2023 Systematic Purchase 1,000.00 10.000 100.0000 10.000
//!   14-Jun-2023 *** Stamp Duty *** 0.05
//!   Closing Unit Balance: 10.000 NAV on 31-Dec-2023: INR 120.0000
//!     Total Cost Value: 1,000.00 Market Value on 31-Dec-2023: INR 1,200.00
//!
//! Fund and folio headers update the running holding context; transaction and
//! closing lines emit records under that context. Lines matching no rule are
//! ignored, with a debug-level count of the suspicious ones (date-like prefix
//! but no rule match) for diagnosability.

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::numeric::to_decimal;
use crate::types::{SummaryRecord, TransactionRecord};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("line {line_no} ({holding}): {field} `{raw}` is not numeric after cleanup")]
    BadNumber {
        line_no: usize,
        holding: String,
        field: &'static str,
        raw: String,
    },
    #[error("line {line_no}: `{raw}` is not a DD-MMM-YYYY date")]
    BadDate { line_no: usize, raw: String },
    #[error("line {line_no}: transaction before any fund/folio header")]
    MissingHeader { line_no: usize },
    #[error("internal pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Everything one classification pass produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementRecords {
    pub transactions: Vec<TransactionRecord>,
    pub summaries: Vec<SummaryRecord>,
    /// Lines that started with a date but matched no rule.
    pub suspicious_ignored: usize,
}

/// Running holding context, updated by fund/folio header lines.
#[derive(Debug, Default)]
struct ScanContext {
    fund_name: Option<String>,
    folio: Option<String>,
}

impl ScanContext {
    /// Both headers must have been seen before any record can be emitted.
    fn holding(&self, line_no: usize) -> Result<(String, String), IngestError> {
        match (&self.folio, &self.fund_name) {
            (Some(folio), Some(fund)) => Ok((folio.clone(), fund.clone())),
            _ => Err(IngestError::MissingHeader { line_no }),
        }
    }
}

fn parse_statement_date(raw: &str, line_no: usize) -> Result<NaiveDate, IngestError> {
    NaiveDate::parse_from_str(raw, "%d-%b-%Y").map_err(|_| IngestError::BadDate {
        line_no,
        raw: raw.to_string(),
    })
}

fn parse_field(
    raw: &str,
    field: &'static str,
    line_no: usize,
    holding: &str,
) -> Result<f64, IngestError> {
    to_decimal(raw).map_err(|e| IngestError::BadNumber {
        line_no,
        holding: holding.to_string(),
        field,
        raw: e.0,
    })
}

/// Classify every line of a statement into transaction and summary records.
///
/// A numeric field that fails coercion is fatal for the whole run: a
/// partially typed table is worse than no table.
pub fn classify_statement(text: &str) -> Result<StatementRecords, IngestError> {
    // Folio No: 123456 / 78  (only the folio number is carried)
    let folio_re = Regex::new(r"(?i)^Folio No:\s*(?P<folio>\d+)")?;

    // date, lazy description, then amount/units/price/unit-balance tokens.
    // The numeric groups are deliberately loose (digits, commas, dots,
    // accounting parentheses in any arrangement): a garbled token like
    // `10.0.00` must still be captured so that coercion can fail loudly,
    // rather than the whole line silently matching no rule.
    let txn_re = Regex::new(concat!(
        r"^(?P<date>\d{2}-[A-Za-z]{3}-\d{4})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<amount>[\d(][\d,.()]*)\s+",
        r"(?P<units>[\d(][\d,.()]*)\s+",
        r"(?P<price>[\d(][\d,.()]*)\s+",
        r"(?P<balance>[\d(][\d,.()]*)\s*$"
    ))?;

    // date + description + a single amount, nothing else
    let cashonly_re = Regex::new(concat!(
        r"^(?P<date>\d{2}-[A-Za-z]{3}-\d{4})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<amount>[\d(][\d,.()]*)\s*$"
    ))?;

    let closing_re = Regex::new(concat!(
        r"^Closing\s+Unit\s+Balance:?\s+(?P<balance>[\d(][\d,.()]*)\s+",
        r"NAV\s+on\s+(?P<nav_date>\d{2}-[A-Za-z]{3}-\d{4}):?\s+(?:INR\s+)?(?P<nav>\d[\d,.]*)\s+",
        r"Total\s+Cost\s+Value:?\s+(?P<cost>\d[\d,.]*)\s+",
        r"Market\s+Value\s+on\s+(?P<mv_date>\d{2}-[A-Za-z]{3}-\d{4}):?\s+(?:INR\s+)?(?P<mv>\d[\d,.]*)"
    ))?;

    let date_prefix_re = Regex::new(r"^\d{2}-[A-Za-z]{3}-\d{4}\b")?;

    let mut ctx = ScanContext::default();
    let mut out = StatementRecords::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Rule 1: fund header — carries both a fund token and an ISIN token.
        let lower = line.to_lowercase();
        if lower.contains("fund") && lower.contains("isin") {
            ctx.fund_name = Some(line.to_string());
            continue;
        }

        // Rule 2: folio header.
        if let Some(caps) = folio_re.captures(line) {
            ctx.folio = Some(caps["folio"].to_string());
            continue;
        }

        // Rule 3: full transaction line (strictly before the cash-only rule:
        // a four-number line also satisfies the cash-only pattern).
        if let Some(caps) = txn_re.captures(line) {
            let (folio, fund_name) = ctx.holding(line_no)?;
            let date = parse_statement_date(&caps["date"], line_no)?;
            let mut description = caps["desc"].trim().to_string();
            let raw_amount = &caps["amount"];

            let mut amount = parse_field(raw_amount, "Amount", line_no, &folio)?;
            if description.contains("IDCW Reinvested") {
                // Reinvested payouts change units, not net cash; keep the
                // rupee figure in the description and zero the cash flow so
                // it is not double-counted as an outflow.
                description = format!("{description} - RS: {raw_amount}");
                amount = 0.0;
            }

            out.transactions.push(TransactionRecord {
                folio: folio.clone(),
                fund_name,
                date,
                description,
                amount,
                units: parse_field(&caps["units"], "Units", line_no, &folio)?,
                price: parse_field(&caps["price"], "Price", line_no, &folio)?,
                unit_balance: parse_field(&caps["balance"], "Unit_balance", line_no, &folio)?,
            });
            continue;
        }

        // Rule 4: cash-only transaction line (no unit/price/balance columns).
        if let Some(caps) = cashonly_re.captures(line) {
            let description = caps["desc"].trim().to_string();
            let is_stamp_duty = description.contains("Stamp Duty");
            let is_idcw_payout =
                description.contains("IDCW") && description.contains("per unit");

            if is_stamp_duty || is_idcw_payout {
                let (folio, fund_name) = ctx.holding(line_no)?;
                let date = parse_statement_date(&caps["date"], line_no)?;
                let mut amount = parse_field(&caps["amount"], "Amount", line_no, &folio)?;
                if is_idcw_payout {
                    // Payout without reinvestment is cash back to the
                    // investor, negative regardless of how it is printed.
                    amount = -amount.abs();
                }
                out.transactions.push(TransactionRecord {
                    folio,
                    fund_name,
                    date,
                    description,
                    amount,
                    units: 0.0,
                    price: 0.0,
                    unit_balance: 0.0,
                });
            } else if date_prefix_re.is_match(line) {
                debug!(line_no, line, "ignored dated line matched no rule");
                out.suspicious_ignored += 1;
            }
            continue;
        }

        // Rule 5: closing summary line.
        if line.starts_with("Closing") {
            if let Some(caps) = closing_re.captures(line) {
                let (folio, fund_name) = ctx.holding(line_no)?;
                out.summaries.push(SummaryRecord {
                    folio: folio.clone(),
                    fund_name,
                    date: parse_statement_date(&caps["mv_date"], line_no)?,
                    closing_unit_balance: parse_field(
                        &caps["balance"],
                        "Closing_unit_balance",
                        line_no,
                        &folio,
                    )?,
                    nav: parse_field(&caps["nav"], "Nav", line_no, &folio)?,
                    total_cost_value: parse_field(
                        &caps["cost"],
                        "Total_cost_value",
                        line_no,
                        &folio,
                    )?,
                    market_value: parse_field(&caps["mv"], "Market_value", line_no, &folio)?,
                    xirr: 0.0,
                    age_days: 0,
                });
            }
            continue;
        }

        // Everything else is decorative/legend text, ignored by design; a
        // dated line landing here is worth counting.
        if date_prefix_re.is_match(line) {
            debug!(line_no, line, "ignored dated line matched no rule");
            out.suspicious_ignored += 1;
        }
    }

    if out.suspicious_ignored > 0 {
        debug!(
            count = out.suspicious_ignored,
            "dated lines ignored by the classifier"
        );
    }
    Ok(out)
}

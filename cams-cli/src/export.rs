//! CSV export of the transaction and summary tables.
//!
//! Column order is part of the contract with downstream consumers; the
//! summary table always ends with the synthetic portfolio row.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use cams_ingest::{SummaryRecord, TransactionRecord};

pub const TRANSACTION_HEADERS: [&str; 8] = [
    "Folio",
    "Fund_name",
    "Date",
    "Description",
    "Amount",
    "Units",
    "Price",
    "Unit_balance",
];

pub const SUMMARY_HEADERS: [&str; 9] = [
    "Folio",
    "Fund_name",
    "Date",
    "Closing_unit_balance",
    "Nav",
    "Total_cost_value",
    "Market_value",
    "Xirr",
    "Age",
];

fn fmt_date(d: NaiveDate) -> String {
    d.format("%d-%b-%Y").to_string()
}

pub fn write_transactions<W: Write>(out: W, txns: &[TransactionRecord]) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(TRANSACTION_HEADERS)?;
    for t in txns {
        w.write_record([
            t.folio.clone(),
            t.fund_name.clone(),
            fmt_date(t.date),
            t.description.clone(),
            format!("{:.2}", t.amount),
            format!("{:.3}", t.units),
            format!("{:.4}", t.price),
            format!("{:.3}", t.unit_balance),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn summary_row(s: &SummaryRecord) -> [String; 9] {
    [
        s.folio.clone(),
        s.fund_name.clone(),
        fmt_date(s.date),
        format!("{:.3}", s.closing_unit_balance),
        format!("{:.4}", s.nav),
        format!("{:.2}", s.total_cost_value),
        format!("{:.2}", s.market_value),
        format!("{:.2}", s.xirr),
        s.age_days.to_string(),
    ]
}

pub fn write_summary<W: Write>(
    out: W,
    summaries: &[SummaryRecord],
    portfolio: &SummaryRecord,
) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(SUMMARY_HEADERS)?;
    for s in summaries {
        w.write_record(summary_row(s))?;
    }
    w.write_record(summary_row(portfolio))?;
    w.flush()?;
    Ok(())
}

/// Write both tables under `out_dir` with the timestamped CAMS_data names.
pub fn write_csv_files(
    out_dir: &Path,
    txns: &[TransactionRecord],
    summaries: &[SummaryRecord],
    portfolio: &SummaryRecord,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let stamp = Local::now().format("%d_%m_%Y_%H_%M");

    let txn_path = out_dir.join(format!("all-txn-CAMS_data_{stamp}.csv"));
    let file = File::create(&txn_path)
        .with_context(|| format!("creating {}", txn_path.display()))?;
    write_transactions(file, txns)?;

    let summary_path = out_dir.join(format!("summary-CAMS_data_{stamp}.csv"));
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    write_summary(file, summaries, portfolio)?;

    Ok((txn_path, summary_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_txn() -> TransactionRecord {
        TransactionRecord {
            folio: "123456".to_string(),
            fund_name: "XYZ Fund - Growth ISIN INF000A0".to_string(),
            date: d(2023, 1, 1),
            description: "Purchase".to_string(),
            amount: 1000.0,
            units: 10.0,
            price: 100.0,
            unit_balance: 10.0,
        }
    }

    fn sample_summary(folio: &str) -> SummaryRecord {
        SummaryRecord {
            folio: folio.to_string(),
            fund_name: "XYZ Fund - Growth ISIN INF000A0".to_string(),
            date: d(2023, 12, 31),
            closing_unit_balance: 10.0,
            nav: 120.0,
            total_cost_value: 1000.0,
            market_value: 1200.0,
            xirr: 20.0,
            age_days: 364,
        }
    }

    #[test]
    fn test_transaction_table_layout() {
        let mut buf = Vec::new();
        write_transactions(&mut buf, &[sample_txn()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Folio,Fund_name,Date,Description,Amount,Units,Price,Unit_balance"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("123456,"), "{row}");
        assert!(row.contains("01-Jan-2023"));
        assert!(row.contains("1000.00,10.000,100.0000,10.000"));
    }

    #[test]
    fn test_summary_table_ends_with_portfolio_row() {
        let mut portfolio = sample_summary("Portfolio");
        portfolio.fund_name = "All holdings".to_string();
        let mut buf = Vec::new();
        write_summary(&mut buf, &[sample_summary("123456")], &portfolio).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("123456,"));
        assert!(lines[2].starts_with("Portfolio,All holdings,"));
        assert!(lines[2].contains("31-Dec-2023"));
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod export;
mod extract;

#[derive(Parser, Debug)]
#[command(
    name = "cams2csv",
    version,
    about = "Convert a CAMS mutual-fund statement into transaction and summary CSVs with XIRR"
)]
struct Cli {
    /// CAMS statement: a PDF, or text already extracted from one
    input: PathBuf,

    /// Password for protected statements
    #[arg(long, default_value = "")]
    password: String,

    /// Directory the CSVs are written into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let text = extract::statement_text(&cli.input, &cli.password)?;

    let records =
        cams_ingest::classify_statement(&text).context("classifying statement lines")?;
    let mut summaries = records.summaries;
    let portfolio = cams_finance::compute_returns(&records.transactions, &mut summaries)
        .context("computing returns")?;

    // Nothing is written until every holding has parsed and solved cleanly:
    // a partial table is worse than no table.
    let (txn_path, summary_path) = export::write_csv_files(
        &cli.out_dir,
        &records.transactions,
        &summaries,
        &portfolio,
    )?;

    println!(
        "Process completed, files saved: {} / {}",
        txn_path.display(),
        summary_path.display()
    );
    Ok(())
}

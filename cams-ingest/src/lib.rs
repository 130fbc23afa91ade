//! cams-ingest: CAMS statement text classification — turns PDF-extracted text
//! into typed transaction and closing-summary records.

pub mod classifier;
pub mod numeric;
pub mod types;

pub use classifier::{classify_statement, IngestError, StatementRecords};
pub use numeric::{clean_numeric_text, to_decimal};
pub use types::{SummaryRecord, TransactionRecord};

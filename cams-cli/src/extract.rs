//! Statement text acquisition: PDF extraction, or a pre-extracted text file.

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("encrypted statement: wrong or missing password")]
    Decryption,
    #[error("could not extract text from the document: {0}")]
    Extraction(String),
}

/// Get the full statement text for classification.
///
/// `.pdf` inputs go through text extraction (with the password when one is
/// given); anything else is treated as already-extracted text.
pub fn statement_text(path: &Path, password: &str) -> Result<String, ExtractError> {
    let read_err = |source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    };

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return fs::read_to_string(path).map_err(read_err);
    }

    let bytes = fs::read(path).map_err(read_err)?;
    let extracted = if password.is_empty() {
        pdf_extract::extract_text_from_mem(&bytes)
    } else {
        pdf_extract::extract_text_from_mem_encrypted(&bytes, password)
    };
    extracted.map_err(|e| {
        let msg = e.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("encrypt") || lower.contains("password") {
            ExtractError::Decryption
        } else {
            ExtractError::Extraction(msg)
        }
    })
}

//! Historical CSV ingestion (`;`-delimited, utf-8 with utf-8-sig fallback)

use crate::error::{PipelineError, Result};
use crate::preprocessing::cleaner::{basic_clean, RawTable};
use crate::types::record::ApplicantRecord;
use std::path::Path;
use tracing::{info, warn};

pub const DELIMITER: u8 = b';';

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encodings tried in order when decoding a CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Plain utf-8; a leading byte-order mark is rejected
    Utf8,
    /// utf-8 with an optional byte-order mark
    Utf8Sig,
}

impl SourceEncoding {
    pub const FALLBACK_ORDER: [SourceEncoding; 2] = [SourceEncoding::Utf8, SourceEncoding::Utf8Sig];

    pub fn name(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Utf8Sig => "utf-8-sig",
        }
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> std::result::Result<&'a str, String> {
        match self {
            SourceEncoding::Utf8 => {
                if bytes.starts_with(UTF8_BOM) {
                    return Err("unexpected byte-order mark".to_string());
                }
                std::str::from_utf8(bytes).map_err(|e| e.to_string())
            }
            SourceEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).map_err(|e| e.to_string())
            }
        }
    }
}

/// Decode raw bytes with the fallback chain, returning the encoding used.
pub fn decode_with_fallback(bytes: &[u8]) -> Result<(&str, SourceEncoding)> {
    let mut last_error = String::new();
    for encoding in SourceEncoding::FALLBACK_ORDER {
        match encoding.decode(bytes) {
            Ok(text) => return Ok((text, encoding)),
            Err(e) => {
                warn!(
                    encoding = encoding.name(),
                    error = %e,
                    "Failed to decode CSV, trying next encoding"
                );
                last_error = format!("{}: {}", encoding.name(), e);
            }
        }
    }
    Err(PipelineError::Encoding(last_error))
}

/// Parse `;`-delimited CSV bytes into a raw table.
pub fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let (text, encoding) = decode_with_fallback(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(|c| c.to_string()).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;

    info!(
        encoding = encoding.name(),
        columns = headers.len(),
        rows = rows.len(),
        "CSV parsed"
    );

    Ok(RawTable::new(headers, rows))
}

/// Read a CSV file from disk into a raw table.
pub fn read_applicant_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    info!(path = %path.display(), "Reading applicant CSV");
    let bytes = std::fs::read(path)?;
    parse_csv(&bytes)
}

/// Read and clean a training CSV. Fails on schema errors.
pub fn load_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<ApplicantRecord>> {
    let table = read_applicant_csv(path)?;
    basic_clean(&table)
}

//! File parsing functionality for benchmark results
//!
//! This module handles loading benchmark records from a JSON file, optionally compressed
//! with ZStandard (`.zst` extension).

use crate::common::BenchmarkRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use zstd::Decoder;

/// Errors that can occur during file parsing
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("Failed to read input file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to decompress zstd file: {0}")]
    Decompression(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("No input file path was provided")]
    MissingPath,
}

type Result<T> = core::result::Result<T, ParsingError>;

/// Reads the input file path from the first line of `reader`
///
/// Surrounding whitespace (including the trailing newline) is ignored.
pub fn read_input_path<R: BufRead>(mut reader: R) -> Result<PathBuf> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ParsingError::MissingPath);
    }
    Ok(PathBuf::from(trimmed))
}

/// Parse a benchmark results file into records
///
/// This function:
/// - Opens the file
/// - Wraps it in a ZStandard decoder if the extension is `.zst`
/// - Deserializes the JSON array of records directly from the reader
///
/// # Arguments
/// * `file_path` - Path to the `.json` or `.json.zst` results file
///
/// # Returns
/// * `Ok(Vec<BenchmarkRecord>)` - Successfully parsed records
/// * `Err(ParsingError)` - If file reading, decompression, or JSON parsing failed
pub fn parse_records(file_path: &Path) -> Result<Vec<BenchmarkRecord>> {
    let file = File::open(file_path)?;
    let is_compressed = file_path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("zst"));

    let records = if is_compressed {
        let decoder = Decoder::new(file)
            .map_err(|e| ParsingError::Decompression(format!("Failed to create decoder: {}", e)))?;
        parse_records_from_reader(decoder)?
    } else {
        parse_records_from_reader(BufReader::new(file))?
    };

    info!(
        path = %file_path.display(),
        records = records.len(),
        "loaded benchmark records"
    );
    Ok(records)
}

/// Deserializes a JSON array of records from any reader
pub fn parse_records_from_reader<R: Read>(reader: R) -> Result<Vec<BenchmarkRecord>> {
    Ok(serde_json::from_reader(reader)?)
}

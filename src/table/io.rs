//! CSV reading and writing for feature tables.

use std::{fs::File, io::Cursor, path::Path};

use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};

use crate::error::{Error, Result, Stage};

/// Parse CSV bytes with a header row, inferring column types from every row.
pub(crate) fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(Error::data(Stage::Table))
}

/// Read a CSV file from `path`.
pub(crate) fn read_csv_file(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| Error::Source(format!("Failed to open CSV file {}: {e}", path.display())))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(Error::data(Stage::Table))
}

/// Serialize a DataFrame as CSV with a header row.
pub(crate) fn write_csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(df)
        .map_err(Error::data(Stage::Assemble))?;
    Ok(buffer)
}

//! CSV loader for the route plan, roster, and inventory sheets
//!
//! Exports from depot tools are UTF-8 (sometimes with a BOM), but sheets saved
//! from Excel on Japanese Windows come out as CP932 (Shift-JIS). Bytes are
//! decoded as UTF-8 first and fall back to CP932.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::SHIFT_JIS;
use haisha_domain::model::RawTable;
use haisha_types::Error;
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub enum TableLoaderError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("{0} is empty")]
    Empty(String),
}

impl From<TableLoaderError> for Error {
    fn from(err: TableLoaderError) -> Self {
        match err {
            TableLoaderError::IoError(e) => Error::Io(e),
            other => Error::InputLoad(other.to_string()),
        }
    }
}

/// Load a CSV file into a [`RawTable`] named `name`
pub fn load_table<P: AsRef<Path>>(path: P, name: &str) -> Result<RawTable, TableLoaderError> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(TableLoaderError::Empty(path.display().to_string()));
    }

    parse_table(&decode(&bytes), name)
}

/// Parse CSV text; the first record is the header row
pub fn parse_table(content: &str, name: &str) -> Result<RawTable, TableLoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(name, headers, rows))
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
            if had_errors {
                warn!("some characters could not be decoded from CP932");
            }
            decoded.into_owned()
        }
    }
}

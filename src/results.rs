//! Result table persistence.
//!
//! One headerless CSV record per image: `<id>,<labels>`. The label field
//! holds commas of its own, so it is quoted on write and unquoted on read.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::types::ResultRow;
use crate::{LabelScanError, Result};

/// Write `rows` to `path`, replacing any existing file.
pub fn save_results(rows: &[ResultRow], path: &Path) -> Result<()> {
    if rows.is_empty() {
        return Err(LabelScanError::InvalidInput(
            "image list is empty".to_string(),
        ));
    }

    info!(path = %path.display(), rows = rows.len(), "saving image results");
    let file = File::create(path).map_err(|e| LabelScanError::io(path, e))?;
    write_results(rows, file)
}

/// Read every row of the result table at `path`.
pub fn load_results(path: &Path) -> Result<Vec<ResultRow>> {
    if path.as_os_str().is_empty() {
        return Err(LabelScanError::InvalidInput("invalid filename".to_string()));
    }

    info!(path = %path.display(), "reading results file");
    let file = File::open(path).map_err(|e| LabelScanError::io(path, e))?;
    read_results(file)
}

/// Serialize rows as headerless CSV.
pub fn write_results<W: Write>(rows: &[ResultRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    for row in rows {
        csv_writer.write_record([row.id.as_str(), row.label_bag_of_words.as_str()])?;
    }
    csv_writer
        .flush()
        .map_err(|e| LabelScanError::Csv(csv::Error::from(e)))?;
    Ok(())
}

/// Parse headerless CSV rows. A record without a label field reads as a
/// row with no labels.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let id = record.get(0).unwrap_or_default();
        let labels = record.get(1).unwrap_or_default();
        rows.push(ResultRow::new(id, labels));
    }
    Ok(rows)
}

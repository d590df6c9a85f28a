//! Delimited-text files: result table extracts and metrics exports.
use crate::common::Result;
use crate::types::{ResultTable, Value};
use ::csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Reads a CSV file with a header row into a table, inferring value types
/// cell by cell. Empty cells are NULL.
pub fn read_table(path: &Path) -> Result<ResultTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| -> Result<Vec<Value>> { Ok(record?.iter().map(Value::infer).collect()) })
        .collect::<Result<Vec<Vec<Value>>>>()?;
    ResultTable::from_rows(&names, rows)
}

/// Writes a table to a CSV file. In append mode rows are added to the end of
/// an existing file and the header is only written when the file is new or
/// empty. NULL is written as an empty cell.
pub fn write_table(table: &ResultTable, path: &Path, append: bool) -> Result<()> {
    let (mut writer, needs_header) = open_writer(path, append)?;
    if needs_header {
        writer.write_record(table.column_names())?;
    }
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_text().unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a header and records, overwriting `path`.
pub fn write_records<H, R>(path: &Path, header: &[H], records: R) -> Result<()>
where
    H: AsRef<[u8]>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = Writer::from_path(path)?;
    writer.write_record(header)?;
    for record in records {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

// Returns the writer and whether a header is needed.
fn open_writer(path: &Path, append: bool) -> Result<(Writer<File>, bool)> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let needs_header = !append || file.metadata()?.len() == 0;
    Ok((WriterBuilder::new().from_writer(file), needs_header))
}

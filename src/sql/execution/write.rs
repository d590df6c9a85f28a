use crate::common::constants::TEXT_COLUMN_TYPE;
use crate::common::{Error, Observer, Result};
use crate::errinput;
use crate::sql::engine::Connection;
use crate::types::{ResultTable, Value};
use itertools::Itertools as _;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid identifier pattern"));

/// Persists a table into `target` (i.e. CREATE TABLE IF NOT EXISTS, then
/// batched INSERT). Returns the number of rows inserted.
///
/// Every column is created as text: NULL stays NULL, dates and timestamps use
/// the fixed formats, and all other values are bound as their text form.
/// Column names are lower-cased and may contain any character. Unquoted
/// parts of `target` are upper-cased, so `merged_orders` and `MERGED_ORDERS`
/// name the same table. An existing target table is reused as is.
/// Rows are inserted in batches of at most `batch_size` rows.
pub fn insert(
    connection: &mut dyn Connection,
    table: &ResultTable,
    target: &str,
    batch_size: usize,
) -> Result<u64> {
    if batch_size == 0 {
        return errinput!("batch size must be positive");
    }
    if table.col_count() == 0 {
        return errinput!("cannot write a table without columns to {target}");
    }
    let target = quote_qualified(target)?;
    let columns = column_names(table)?;

    let definitions = columns
        .iter()
        .map(|c| format!("{c} {TEXT_COLUMN_TYPE}"))
        .join(", ");
    connection.execute(&format!(
        "CREATE TABLE IF NOT EXISTS {target} ({definitions})"
    ))?;

    let statement = format!(
        "INSERT INTO {target} ({}) VALUES ({})",
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    let mut count = 0;
    for chunk in table.rows().chunks(batch_size) {
        let params: Vec<Vec<Value>> = chunk
            .iter()
            .map(|row| row.iter().map(to_parameter).collect())
            .collect();
        count += connection.execute_batch(&statement, &params)?;
    }
    Ok(count)
}

/// Like `insert`, but reports the outcome to the observer and returns every
/// failure as `Error::Write`.
pub fn write(
    connection: &mut dyn Connection,
    table: &ResultTable,
    target: &str,
    batch_size: usize,
    observer: &dyn Observer,
) -> Result<u64> {
    match insert(connection, table, target, batch_size) {
        Ok(count) => {
            observer.info(&format!(
                "Successfully inserted {count} rows into Snowflake table '{target}'."
            ));
            Ok(count)
        }
        Err(err) => Err(write_error(err, observer)),
    }
}

/// Converts an error into `Error::Write` and reports it.
pub(crate) fn write_error(err: Error, observer: &dyn Observer) -> Error {
    let message = match err {
        Error::Write(message) => message,
        other => other.to_string(),
    };
    observer.error(&format!("Error while writing data to Snowflake: {message}"));
    Error::Write(message)
}

/// Checks a table before writing: every required column is present and no
/// value is NULL. Problems are reported as warnings.
pub fn validate<S: AsRef<str>>(
    table: &ResultTable,
    required_columns: &[S],
    observer: &dyn Observer,
) -> bool {
    let mut valid = true;
    let missing = table.schema().missing(required_columns);
    if !missing.is_empty() {
        observer.warn(&format!("Missing required columns: [{}]", missing.join(", ")));
        valid = false;
    }
    if table.has_nulls() {
        observer.warn("Table contains NULL values.");
        valid = false;
    }
    valid
}

fn to_parameter(value: &Value) -> Value {
    match value.to_text() {
        Some(text) => Value::String(text),
        None => Value::Null,
    }
}

/// Lower-cases and quotes the column names, rejecting empty names and names
/// that collide once lower-cased.
fn column_names(table: &ResultTable) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(table.col_count());
    for column in table.schema().iter() {
        let name = column.name().to_lowercase();
        if !seen.insert(name.clone()) {
            return errinput!("duplicate column name '{name}'");
        }
        names.push(quote_column(&name)?);
    }
    Ok(names)
}

/// Quotes a column name. Any non-empty name is allowed; embedded quotes are
/// doubled.
fn quote_column(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return errinput!("column names must not be empty");
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quotes a possibly dot-qualified name, e.g. `db.schema.table`.
fn quote_qualified(name: &str) -> Result<String> {
    Ok(split_qualified(name)?
        .into_iter()
        .map(quote)
        .collect::<Result<Vec<_>>>()?
        .join("."))
}

/// Splits a qualified name on the dots outside double quotes.
fn split_qualified(name: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let (mut start, mut quoted) = (0, false);
    for (i, c) in name.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '.' if !quoted => {
                parts.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return errinput!("unterminated quote in '{name}'");
    }
    parts.push(&name[start..]);
    Ok(parts)
}

/// Quotes one part of a table name. A bare part must be a plain identifier
/// and is upper-cased, matching how Snowflake resolves unquoted names. A
/// quoted part is kept as written.
fn quote(identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if let Some(inner) = identifier.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        if inner.is_empty() || inner.replace("\"\"", "").contains('"') {
            return errinput!("invalid identifier '{identifier}'");
        }
        return Ok(identifier.to_string());
    }
    if !IDENTIFIER.is_match(identifier) {
        return errinput!("invalid identifier '{identifier}'");
    }
    Ok(format!("\"{}\"", identifier.to_uppercase()))
}

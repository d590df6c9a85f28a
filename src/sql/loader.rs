use crate::common::Observer;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads a SQL query from a file.
///
/// Never fails: a missing or unreadable file is reported to the observer and
/// yields an empty string, which callers treat as "no query".
pub fn read_sql_file(path: impl AsRef<Path>, observer: &dyn Observer) -> String {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(query) => query,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            observer.error(&format!("SQL file '{}' not found.", path.display()));
            String::new()
        }
        Err(err) => {
            observer.error(&format!(
                "Error reading SQL file '{}': {err}",
                path.display()
            ));
            String::new()
        }
    }
}

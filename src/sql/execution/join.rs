use crate::common::constants::{LEFT_SUFFIX, RIGHT_SUFFIX};
use crate::common::{Error, Observer, Result};
use crate::errinput;
use crate::metrics::record::now;
use crate::metrics::{JoinRecord, MetricsLog};
use crate::sql::execution::transform;
use crate::types::{Column, DataType, ResultTable, Row, Schema, Value};
use itertools::Itertools as _;
use std::collections::{HashMap, HashSet};

/// Inner-joins two tables on `key_columns` and projects the result to
/// `output_columns`.
///
/// Key values are compared by their text form (see `Value::join_key`), so a
/// source returning `1` joins with one returning `"1"`. Duplicate column
/// names in either input and duplicate rows in the joined result are
/// reported as warnings. One join record is appended per successful call;
/// a missing key or output column fails the call and records nothing.
pub fn join<S: AsRef<str>>(
    left: &ResultTable,
    right: &ResultTable,
    key_columns: &[S],
    output_columns: &[S],
    joins: &mut MetricsLog<JoinRecord>,
    observer: &dyn Observer,
) -> Result<ResultTable> {
    observer.info("Joining results...");
    let left_shape = left.shape();
    let right_shape = right.shape();
    observer.info(&format!(
        "Initial left shape: {left_shape}, right shape: {right_shape}"
    ));

    let keys: Vec<&str> = key_columns.iter().map(AsRef::as_ref).collect();
    let outputs: Vec<&str> = output_columns.iter().map(AsRef::as_ref).collect();

    for (side, table) in [("left", left), ("right", right)] {
        let duplicated = table.schema().duplicated_names();
        if !duplicated.is_empty() {
            observer.warn(&format!(
                "Duplicated columns in {side} table: [{}]",
                duplicated.join(", ")
            ));
        }
    }

    let joined = hash(left, right, &keys)?;

    let duplicate_rows = joined.duplicate_row_count();
    if duplicate_rows > 0 {
        observer.warn(&format!(
            "Number of duplicated rows in joined table: {duplicate_rows}"
        ));
    } else {
        observer.info("No duplicated rows found in joined table.");
    }
    let result_shape = joined.shape();
    observer.info(&format!("Shape of joined table: {result_shape}"));

    let result = transform::project(&joined, &outputs)?;
    observer.info(&format!("Shape of final output table: {}", result.shape()));

    joins.append(JoinRecord {
        left_shape,
        right_shape,
        join_columns: keys.iter().map(|k| k.to_string()).collect(),
        output_columns: outputs.iter().map(|c| c.to_string()).collect(),
        result_shape,
        duplicate_rows,
        timestamp: now(),
    });
    Ok(result)
}

/// Executes a hash join. This builds a hash table of rows from the right
/// table keyed on the coerced join values, then iterates over the left table
/// and looks up matching rows in the hash table. Rows with an undefined key
/// value never match.
///
/// The joined table holds the left columns, with key columns as text,
/// followed by the right non-key columns. A non-key name present on both
/// sides is suffixed with `_x` on the left and `_y` on the right. Rows are
/// emitted in left order, then right order.
pub fn hash(left: &ResultTable, right: &ResultTable, keys: &[&str]) -> Result<ResultTable> {
    if keys.is_empty() {
        return errinput!("at least one join column is required");
    }
    let mut missing = left.schema().missing(keys);
    missing.extend(right.schema().missing(keys));
    if !missing.is_empty() {
        return Err(Error::MissingColumn(missing.into_iter().unique().collect()));
    }

    let left_keys = key_indices(left.schema(), keys);
    let right_keys = key_indices(right.schema(), keys);
    let right_rest: Vec<usize> = (0..right.col_count())
        .filter(|i| !right_keys.contains(i))
        .collect();

    // Build the hash table from the right source.
    let mut table: HashMap<Vec<String>, Vec<&Row>> = HashMap::new();
    for row in right.rows() {
        if let Some(key) = coerce(row, &right_keys)? {
            table.entry(key).or_default().push(row);
        }
    }

    let mut rows = Vec::new();
    for row in left.rows() {
        let Some(key) = coerce(row, &left_keys)? else {
            continue;
        };
        let Some(matches) = table.get(&key) else {
            continue;
        };
        let mut base = row.clone();
        for (&index, text) in left_keys.iter().zip(&key) {
            base.update_value(index, Value::String(text.clone()))?;
        }
        for other in matches {
            let mut joined = base.clone();
            for &index in &right_rest {
                joined.push(other.get_value(index)?.clone());
            }
            rows.push(joined);
        }
    }

    let schema = joined_schema(left.schema(), &left_keys, right.schema(), &right_rest);
    ResultTable::new(schema, rows)
}

fn key_indices(schema: &Schema, keys: &[&str]) -> Vec<usize> {
    keys.iter().filter_map(|key| schema.index_of(key)).collect()
}

/// The coerced key of a row, or None if any key value is undefined.
fn coerce(row: &Row, indices: &[usize]) -> Result<Option<Vec<String>>> {
    let mut key = Vec::with_capacity(indices.len());
    for &index in indices {
        match row.get_value(index)?.join_key() {
            Some(text) => key.push(text),
            None => return Ok(None),
        }
    }
    Ok(Some(key))
}

fn joined_schema(left: &Schema, left_keys: &[usize], right: &Schema, right_rest: &[usize]) -> Schema {
    let left_names: HashSet<&str> = (0..left.col_count())
        .filter(|i| !left_keys.contains(i))
        .map(|i| left.get_column(i).name())
        .collect();
    let right_names: HashSet<&str> = right_rest.iter().map(|&i| right.get_column(i).name()).collect();

    let mut columns: Vec<Column> = Vec::with_capacity(left.col_count() + right_rest.len());
    for (i, column) in left.iter().enumerate() {
        let mut column = column.clone();
        if left_keys.contains(&i) {
            column.set_data_type(DataType::Text);
        } else if right_names.contains(column.name()) {
            column.set_name(&format!("{}{LEFT_SUFFIX}", column.name()));
        }
        columns.push(column);
    }
    for &i in right_rest {
        let mut column = right.get_column(i).clone();
        if left_names.contains(column.name()) {
            column.set_name(&format!("{}{RIGHT_SUFFIX}", column.name()));
        }
        columns.push(column);
    }
    Schema::new(columns)
}

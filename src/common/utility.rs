use crate::types::{Column, DataType, ResultTable, Row, Schema, Value};
use chrono::{Duration, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

/// A deterministic random number generator for reproducible test data.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn create_random_data_type(rng: &mut impl Rng) -> DataType {
    match rng.gen_range(0..6) {
        0 => DataType::Bool,
        1 => DataType::Int,
        2 => DataType::Float,
        3 => DataType::Text,
        4 => DataType::Date,
        _ => DataType::Timestamp,
    }
}

/// Creates a random value of the given type, or NULL with probability
/// `null_ratio`.
pub fn create_random_value(rng: &mut impl Rng, data_type: DataType, null_ratio: f64) -> Value {
    if rng.gen_bool(null_ratio) {
        return Value::Null;
    }
    let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    match data_type {
        DataType::Bool => Value::Boolean(rng.gen()),
        DataType::Int => Value::Integer(rng.gen_range(-1000..1000)),
        DataType::Float => Value::Float(rng.gen_range(-1000.0..1000.0)),
        DataType::Text => {
            let len = rng.gen_range(1..24);
            Value::String((&mut *rng).sample_iter(&Alphanumeric).take(len).map(char::from).collect())
        }
        DataType::Date => Value::Date(epoch + Duration::days(rng.gen_range(0..2000))),
        DataType::Timestamp => Value::Timestamp(
            epoch.and_hms_opt(0, 0, 0).unwrap_or_default()
                + Duration::seconds(rng.gen_range(0..200_000_000)),
        ),
        DataType::Invalid => Value::Null,
    }
}

/// Creates a random key value in `0..key_range`. Keys come back either as
/// integers or as their decimal text, the way two warehouses may disagree on
/// an id column's type. A small share of keys is NULL.
pub fn create_random_key(rng: &mut impl Rng, key_range: i64) -> Value {
    if rng.gen_bool(0.05) {
        return Value::Null;
    }
    let key = rng.gen_range(0..key_range);
    match rng.gen_bool(0.5) {
        true => Value::Integer(key),
        false => Value::String(key.to_string()),
    }
}

/// Creates a table with the given key columns followed by `extra_columns`
/// randomly typed columns named `{prefix}_{i}`.
pub fn create_random_table(
    rng: &mut impl Rng,
    key_columns: &[&str],
    prefix: &str,
    extra_columns: usize,
    key_range: i64,
    n_rows: usize,
) -> ResultTable {
    let mut columns: Vec<Column> = key_columns
        .iter()
        .map(|name| Column::new(name, DataType::Text))
        .collect();
    for i in 0..extra_columns {
        columns.push(Column::new(&format!("{prefix}_{i}"), create_random_data_type(rng)));
    }
    let schema = Schema::new(columns);

    let rows = (0..n_rows)
        .map(|_| {
            schema
                .iter()
                .enumerate()
                .map(|(i, column)| match i < key_columns.len() {
                    true => create_random_key(rng, key_range),
                    false => create_random_value(rng, column.data_type(), 0.1),
                })
                .collect::<Vec<Value>>()
        })
        .map(Row::from)
        .collect();

    let mut table = ResultTable::empty(schema);
    *table.rows_mut() = rows;
    table
}

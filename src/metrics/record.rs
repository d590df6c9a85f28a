use crate::common::constants::TIMESTAMP_FORMAT;
use crate::sql::engine::Source;
use crate::types::Shape;
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

/// A record that can be exported as one CSV line.
pub trait CsvRecord {
    /// Column headers, in record order.
    const HEADER: &'static [&'static str];

    fn to_record(&self) -> Vec<String>;
}

/// Volume, cost and timing of one executed query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportRecord {
    pub source: Source,
    pub query: String,
    pub rows: usize,
    pub columns: usize,
    /// Transferred volume in MB; None when the source reports no volume.
    pub data_mb: Option<f64>,
    /// Estimated cost in EUR; None when the source reports no volume.
    pub cost_eur: Option<f64>,
    pub elapsed_secs: f64,
    pub timestamp: NaiveDateTime,
}

impl CsvRecord for ImportRecord {
    const HEADER: &'static [&'static str] = &[
        "source",
        "query",
        "rows",
        "columns",
        "data_mb",
        "cost_eur",
        "time_sec",
        "timestamp",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.source.to_string(),
            self.query.clone(),
            self.rows.to_string(),
            self.columns.to_string(),
            optional(self.data_mb),
            optional(self.cost_eur),
            self.elapsed_secs.to_string(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

/// Shapes and duplicate statistics of one join.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JoinRecord {
    pub left_shape: Shape,
    pub right_shape: Shape,
    pub join_columns: Vec<String>,
    pub output_columns: Vec<String>,
    /// Shape of the joined rows before projection.
    pub result_shape: Shape,
    pub duplicate_rows: usize,
    pub timestamp: NaiveDateTime,
}

impl CsvRecord for JoinRecord {
    const HEADER: &'static [&'static str] = &[
        "df1_shape",
        "df2_shape",
        "join_columns",
        "output_columns",
        "result_shape",
        "duplicate_rows",
        "timestamp",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.left_shape.to_string(),
            self.right_shape.to_string(),
            self.join_columns.join("|"),
            self.output_columns.join("|"),
            self.result_shape.to_string(),
            self.duplicate_rows.to_string(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

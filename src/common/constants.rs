// Writer
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TEXT_COLUMN_TYPE: &str = "STRING";
pub const DEFAULT_BATCH_SIZE: usize = 16384;

// Join Engine
pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

// Query Executor
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
/// Approximate Snowflake cost per byte, in EUR. Not a contractual rate.
pub const SNOWFLAKE_EUR_PER_BYTE: f64 = 0.000002;
/// Approximate BigQuery cost per byte, in EUR. Not a contractual rate.
pub const BIGQUERY_EUR_PER_BYTE: f64 = 0.00000465;

// Metrics export
pub const IMPORT_LOG_FILE: &str = "import_logs.csv";
pub const JOIN_LOG_FILE: &str = "join_logs.csv";

// Session
pub const EMPTY_QUERY_MSG: &str = "Refusing to execute an empty query.";
pub const NO_CONNECTOR_MSG: &str = "No connector registered for source";

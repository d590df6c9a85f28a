use crate::common::Result;
use crate::config::SourceConfig;
use crate::types::{ResultTable, Value};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One of the two warehouses a session reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Snowflake,
    BigQuery,
}

impl Source {
    /// The configuration section holding this source's parameters.
    pub fn config_section(&self) -> &'static str {
        match self {
            Source::Snowflake => "snowflake",
            Source::BigQuery => "bigquery",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Snowflake => write!(f, "Snowflake"),
            Source::BigQuery => write!(f, "BigQuery"),
        }
    }
}

/// The result of running a query on a warehouse.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutcome {
    /// The complete result set.
    pub table: ResultTable,
    /// Bytes processed/transferred as reported by the warehouse, if it
    /// reports them at all.
    pub bytes_processed: Option<u64>,
}

impl QueryOutcome {
    pub fn new(table: ResultTable, bytes_processed: Option<u64>) -> Self {
        Self {
            table,
            bytes_processed,
        }
    }
}

/// Creates connections to a warehouse.
///
/// A connector is the client factory for one vendor. It is invoked at most
/// once per source and session by the connection manager, which owns the
/// resulting connection.
pub trait Connector {
    /// Opens a connection with the given parameters. Authentication and
    /// connectivity failures are returned as `Error::Connection`.
    fn connect(&self, config: &SourceConfig) -> Result<Box<dyn Connection>>;
}

/// A live session with a warehouse.
///
/// All calls block until the warehouse responds; there is no streaming or
/// pagination, whole result sets are returned at once.
pub trait Connection {
    /// Runs a query and returns its complete result.
    fn query(&mut self, sql: &str) -> Result<QueryOutcome>;
    /// Runs a statement that returns no rows (e.g. DDL), returning the number
    /// of affected rows.
    fn execute(&mut self, sql: &str) -> Result<u64>;
    /// Runs a parameterized statement once per parameter row, as one batch.
    /// Parameters are positional (`?`) and `Value::Null` binds SQL NULL.
    fn execute_batch(&mut self, sql: &str, params: &[Vec<Value>]) -> Result<u64>;
    /// Releases the session. Further calls may fail.
    fn close(&mut self) -> Result<()>;
}

/// A cached, shared connection. Cloning the handle does not open a new
/// connection; `Rc::ptr_eq` identifies the same one.
pub type ConnectionHandle = Rc<RefCell<Box<dyn Connection>>>;

use serde::{Deserialize, Serialize};

/// Constructs an Error::InvalidInput via format!() and into().
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => { $crate::common::Error::InvalidInput(format!($($args)*)).into() };
}

/// Constructs an Error::InvalidData via format!() and into().
#[macro_export]
macro_rules! errdata {
    ($($args:tt)*) => { $crate::common::Error::InvalidData(format!($($args)*)).into() };
}

/// rustybridge errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// A connection or client could not be created, e.g. bad credentials or an
    /// unreachable account.
    Connection(String),
    /// A query failed to execute on a source (syntax, permissions, timeouts).
    Query(String),
    /// One or more columns required by an operation are absent.
    MissingColumn(Vec<String>),
    /// Invalid user input, e.g. an empty query or an invalid identifier.
    InvalidInput(String),
    /// Invalid data, e.g. a ragged table or an unparseable value.
    InvalidData(String),
    /// Persisting a table to the target failed.
    Write(String),
    /// Missing or malformed configuration.
    Config(String),
    /// An IO error.
    IO(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connection(msg) => write!(f, "connection error: {msg}"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
            Error::MissingColumn(columns) => {
                write!(f, "missing column(s): {}", columns.join(", "))
            }
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::Write(msg) => write!(f, "write error: {msg}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::IO(msg) => write!(f, "io error: {msg}"),
        }
    }
}

/// A rustybridge Result returning Error.
pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<Error> for Result<T> {
    fn from(error: Error) -> Self {
        Err(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::IO(err.to_string())
    }
}

//! Query execution, joining and writing of result tables.
mod execute;
mod join;
pub mod transform;
mod write;

pub use execute::execute_query;
pub use join::{hash, join};
pub use write::{insert, validate, write};
pub(crate) use write::write_error;

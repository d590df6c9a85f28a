pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use row::Row;
pub use schema::{Column, DataType, Schema};
pub use table::{ResultTable, Shape};
pub use value::Value;

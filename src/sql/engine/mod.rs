mod engine;
mod manager;
pub mod memory;
mod session;

pub use engine::{Connection, ConnectionHandle, Connector, QueryOutcome, Source};
pub use manager::ConnectionManager;
pub use memory::{MemoryConnector, MemoryWarehouse};
pub use session::Session;

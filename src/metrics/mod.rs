//! Provenance and cost metrics recorded by a session.
pub mod export;
mod history;
pub mod record;

pub use export::{export, latency_summary, total_cost_eur, LatencySummary};
pub use history::MetricsLog;
pub use record::{CsvRecord, ImportRecord, JoinRecord};

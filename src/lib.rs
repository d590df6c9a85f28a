#![crate_type = "lib"]
#![crate_name = "rustybridge"]

pub mod common;
pub mod config;
pub mod metrics;
pub mod sql;
pub mod storage;
pub mod types;

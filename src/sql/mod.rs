pub mod engine;
pub mod execution;
pub mod loader;
#[cfg(test)]
mod tests;

pub use loader::read_sql_file;

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{
    BigQueryConfig, CostRates, PipelineConfig, ReplayConfig, Settings, SnowflakeConfig,
    SourceConfig, WriterConfig, ENV_PREFIX,
};

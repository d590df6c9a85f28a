use crate::common::constants::{BIGQUERY_EUR_PER_BYTE, DEFAULT_BATCH_SIZE, SNOWFLAKE_EUR_PER_BYTE};
use crate::common::{Error, Result};
use crate::sql::engine::Source;
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variables overriding the configuration file start with this
/// prefix, and use `__` between nested keys: `RUSTYBRIDGE_SNOWFLAKE__USER`.
pub const ENV_PREFIX: &str = "RUSTYBRIDGE";

/// Connection parameters for the Snowflake warehouse.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnowflakeConfig {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl fmt::Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Connection parameters for the BigQuery warehouse.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BigQueryConfig {
    pub project: String,
    /// Path to a service account credentials file.
    pub credentials: String,
}

/// The configuration handed to a connector for one source.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceConfig {
    Snowflake(SnowflakeConfig),
    BigQuery(BigQueryConfig),
}

impl SourceConfig {
    pub fn source(&self) -> Source {
        match self {
            SourceConfig::Snowflake(_) => Source::Snowflake,
            SourceConfig::BigQuery(_) => Source::BigQuery,
        }
    }

    /// The connection parameters as flat key/value pairs.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        match self {
            SourceConfig::Snowflake(c) => vec![
                ("user", c.user.as_str()),
                ("password", c.password.as_str()),
                ("account", c.account.as_str()),
                ("warehouse", c.warehouse.as_str()),
                ("database", c.database.as_str()),
                ("schema", c.schema.as_str()),
            ],
            SourceConfig::BigQuery(c) => vec![
                ("project", c.project.as_str()),
                ("credentials", c.credentials.as_str()),
            ],
        }
    }

    /// Names of the parameters that are empty.
    pub fn missing(&self) -> Vec<&'static str> {
        self.pairs()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| key)
            .collect()
    }
}

/// Per-byte cost rates used to estimate what a query cost.
///
/// These are rough approximations in EUR with no validity date. They are
/// configuration, not contract: override them when the pricing is known.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostRates {
    pub snowflake_eur_per_byte: f64,
    pub bigquery_eur_per_byte: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            snowflake_eur_per_byte: SNOWFLAKE_EUR_PER_BYTE,
            bigquery_eur_per_byte: BIGQUERY_EUR_PER_BYTE,
        }
    }
}

impl CostRates {
    pub fn rate(&self, source: Source) -> f64 {
        match source {
            Source::Snowflake => self.snowflake_eur_per_byte,
            Source::BigQuery => self.bigquery_eur_per_byte,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Maximum number of rows bound to a single batched insert.
    pub batch_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// CSV extracts that stand in for live sources when replaying a pipeline.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReplayConfig {
    pub left_csv: PathBuf,
    pub right_csv: PathBuf,
}

/// A complete extract, join and load run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PipelineConfig {
    pub left_source: Source,
    pub left_sql: PathBuf,
    pub right_source: Source,
    pub right_sql: PathBuf,
    pub join_columns: Vec<String>,
    pub output_columns: Vec<String>,
    pub target_table: String,
    pub replay: Option<ReplayConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub snowflake: SnowflakeConfig,
    #[serde(default)]
    pub bigquery: BigQueryConfig,
    #[serde(default)]
    pub costs: CostRates,
    #[serde(default)]
    pub writer: WriterConfig,
    pub pipeline: Option<PipelineConfig>,
}

impl Settings {
    /// Loads settings from an optional TOML file, overridden by environment
    /// variables with the `RUSTYBRIDGE_` prefix.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pipeline.join_columns")
                    .with_list_parse_key("pipeline.output_columns"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parses settings from TOML text, without consulting the environment.
    pub fn from_toml(text: &str) -> Result<Settings> {
        Ok(Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    pub fn source_config(&self, source: Source) -> SourceConfig {
        match source {
            Source::Snowflake => SourceConfig::Snowflake(self.snowflake.clone()),
            Source::BigQuery => SourceConfig::BigQuery(self.bigquery.clone()),
        }
    }

    /// Checks that every connection parameter is set, reporting all of the
    /// missing keys at once.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = [Source::Snowflake, Source::BigQuery]
            .into_iter()
            .flat_map(|source| {
                let section = source.config_section();
                self.source_config(source)
                    .missing()
                    .into_iter()
                    .map(move |key| format!("{section}.{key}"))
            })
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing configuration values: {}",
                missing.join(", ")
            )));
        }
        if self.writer.batch_size == 0 {
            return Err(Error::Config("writer.batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [snowflake]
        user = "loader"
        password = "hunter2"
        account = "xy12345.eu-central-1"
        warehouse = "COMPUTE_WH"
        database = "ANALYTICS"
        schema = "PUBLIC"

        [bigquery]
        project = "events-prod"
        credentials = "/secrets/bq.json"

        [costs]
        bigquery_eur_per_byte = 0.000001

        [pipeline]
        left_source = "bigquery"
        left_sql = "queries/bigquery_query.sql"
        right_source = "snowflake"
        right_sql = "queries/snowflake_query.sql"
        join_columns = ["order_id", "user_id"]
        output_columns = ["order_id", "user_id", "amount"]
        target_table = "orders_items_events"
    "#;

    #[test]
    fn test_from_toml() {
        let settings = Settings::from_toml(FULL).unwrap();
        assert_eq!(settings.snowflake.user, "loader");
        assert_eq!(settings.bigquery.project, "events-prod");
        assert_eq!(settings.costs.bigquery_eur_per_byte, 0.000001);
        // unset rates keep their defaults
        assert_eq!(settings.costs.snowflake_eur_per_byte, SNOWFLAKE_EUR_PER_BYTE);
        assert_eq!(settings.writer.batch_size, DEFAULT_BATCH_SIZE);

        let pipeline = settings.pipeline.as_ref().unwrap();
        assert_eq!(pipeline.left_source, Source::BigQuery);
        assert_eq!(pipeline.join_columns, vec!["order_id", "user_id"]);
        assert!(pipeline.replay.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_all_missing() {
        let settings = Settings::from_toml(
            r#"
            [snowflake]
            user = "loader"
            [bigquery]
            project = "events-prod"
            "#,
        )
        .unwrap();

        let Err(Error::Config(msg)) = settings.validate() else {
            panic!("expected a configuration error");
        };
        assert_eq!(
            msg,
            "missing configuration values: snowflake.password, snowflake.account, \
             snowflake.warehouse, snowflake.database, snowflake.schema, bigquery.credentials"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = Settings::from_toml(FULL).unwrap();
        let debug = format!("{:?}", settings.snowflake);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_cost_rates() {
        let rates = CostRates::default();
        assert_eq!(rates.rate(Source::Snowflake), SNOWFLAKE_EUR_PER_BYTE);
        assert_eq!(rates.rate(Source::BigQuery), BIGQUERY_EUR_PER_BYTE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, FULL.as_bytes()).unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.snowflake.database, "ANALYTICS");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Settings::load(Some(Path::new("/nonexistent/rustybridge.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

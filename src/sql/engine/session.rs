use super::{ConnectionManager, Connector, Source};
use crate::common::constants::{EMPTY_QUERY_MSG, IMPORT_LOG_FILE, JOIN_LOG_FILE};
use crate::common::{Observer, Result};
use crate::config::Settings;
use crate::errinput;
use crate::metrics::{self, ImportRecord, JoinRecord, MetricsLog};
use crate::sql::execution;
use crate::sql::loader::read_sql_file;
use crate::types::ResultTable;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The target every joined table is written to.
const WRITE_TARGET: Source = Source::Snowflake;

/// A session runs queries against both sources, joins their results and
/// writes the joined table back to Snowflake.
///
/// The session owns the connections it opens and the import and join
/// metrics recorded along the way. Dropping it closes its connections.
pub struct Session {
    settings: Settings,
    connections: ConnectionManager,
    imports: MetricsLog<ImportRecord>,
    joins: MetricsLog<JoinRecord>,
    observer: Arc<dyn Observer>,
}

impl Session {
    /// Creates a session. No connection is opened until a source is used.
    pub fn new(
        settings: Settings,
        connectors: Vec<(Source, Box<dyn Connector>)>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        let mut connections = ConnectionManager::new(&settings, Arc::clone(&observer));
        for (source, connector) in connectors {
            connections.register(source, connector);
        }
        Self {
            settings,
            connections,
            imports: MetricsLog::new(),
            joins: MetricsLog::new(),
            observer,
        }
    }

    /// Registers (or replaces) the connector for a source.
    pub fn register(&mut self, source: Source, connector: Box<dyn Connector>) -> &mut Self {
        self.connections.register(source, connector);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs a query on a source and returns its complete result.
    pub fn execute(&mut self, source: Source, query: &str) -> Result<ResultTable> {
        if query.trim().is_empty() {
            self.observer.error(EMPTY_QUERY_MSG);
            return errinput!("{EMPTY_QUERY_MSG}");
        }
        execution::execute_query(
            &mut self.connections,
            source,
            query,
            &self.settings.costs,
            &mut self.imports,
            self.observer.as_ref(),
        )
    }

    /// Reads a query from a file and runs it. A missing file yields an empty
    /// query, which is rejected.
    pub fn execute_file(&mut self, source: Source, path: &Path) -> Result<ResultTable> {
        let query = read_sql_file(path, self.observer.as_ref());
        self.execute(source, &query)
    }

    /// Inner-joins two results on `key_columns` and projects the joined
    /// table to `output_columns`.
    pub fn join<S: AsRef<str>>(
        &mut self,
        left: &ResultTable,
        right: &ResultTable,
        key_columns: &[S],
        output_columns: &[S],
    ) -> Result<ResultTable> {
        execution::join(
            left,
            right,
            key_columns,
            output_columns,
            &mut self.joins,
            self.observer.as_ref(),
        )
    }

    /// Writes a table to `target` on Snowflake, creating the table if it does
    /// not exist. Returns the number of rows inserted. Every failure,
    /// including failing to connect, is returned as `Error::Write`.
    ///
    /// Unquoted parts of `target` resolve upper-cased, as on Snowflake; quote a
    /// part (e.g. `"merged_orders"`) to keep its case.
    pub fn write(&mut self, table: &ResultTable, target: &str) -> Result<u64> {
        self.observer.info(&format!(
            "Writing {} rows to Snowflake table '{target}'...",
            table.row_count()
        ));
        let handle = match self.connections.get_connection(WRITE_TARGET) {
            Ok(handle) => handle,
            Err(err) => return Err(execution::write_error(err, self.observer.as_ref())),
        };
        let mut connection = handle.borrow_mut();
        execution::write(
            &mut **connection,
            table,
            target,
            self.settings.writer.batch_size,
            self.observer.as_ref(),
        )
    }

    /// Checks that a table has the required columns and no NULL values.
    pub fn validate<S: AsRef<str>>(&self, table: &ResultTable, required_columns: &[S]) -> bool {
        execution::validate(table, required_columns, self.observer.as_ref())
    }

    /// Reports a table's shape, approximate memory usage, duplicate rows and
    /// whether it holds NULL values.
    pub fn describe(&self, table: &ResultTable, label: &str) {
        self.observer.info(&format!(
            "{label}: shape {}, memory {:.2} KB, duplicated rows {}, has nulls: {}",
            table.shape(),
            table.memory_usage_bytes() as f64 / 1024.0,
            table.duplicate_row_count(),
            table.has_nulls()
        ));
    }

    /// The import records, one per successful query, oldest first.
    pub fn import_log(&self) -> &[ImportRecord] {
        self.imports.records()
    }

    /// The join records, one per successful join, oldest first.
    pub fn join_log(&self) -> &[JoinRecord] {
        self.joins.records()
    }

    /// Writes both metrics logs as CSV files into `dir`, creating it if
    /// needed.
    pub fn export_metrics(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        metrics::export(self.import_log(), &dir.join(IMPORT_LOG_FILE))?;
        metrics::export(self.join_log(), &dir.join(JOIN_LOG_FILE))?;
        self.observer
            .info(&format!("Metrics written to '{}'.", dir.display()));
        Ok(())
    }

    /// Closes all connections. The session stays usable and reconnects on
    /// demand.
    pub fn close(&mut self) {
        self.connections.close_all();
    }
}

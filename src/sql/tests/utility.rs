use crate::common::CaptureObserver;
use crate::config::Settings;
use crate::sql::engine::{Connector, MemoryWarehouse, Session, Source};
use crate::types::{ResultTable, Value};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub const SETTINGS: &str = r#"
    [snowflake]
    user = "loader"
    password = "secret"
    account = "xy12345.eu-central-1"
    warehouse = "COMPUTE_WH"
    database = "ANALYTICS"
    schema = "PUBLIC"

    [bigquery]
    project = "acme-events"
    credentials = "/etc/rustybridge/service-account.json"

    [writer]
    batch_size = 2
"#;

/// The pipeline test runner.
///
/// Holds a session wired to one in-memory warehouse per source, and the
/// result tables produced so far, by name.
pub struct PipelineRunner {
    /// The session whose behavior we're testing.
    session: RefCell<Session>,
    pub(crate) snowflake: MemoryWarehouse,
    pub(crate) bigquery: MemoryWarehouse,
    pub(crate) observer: Arc<CaptureObserver>,
    tables: HashMap<String, ResultTable>,
}

impl PipelineRunner {
    pub(crate) fn new() -> Self {
        Self::with_settings(SETTINGS)
    }

    pub(crate) fn with_settings(toml: &str) -> Self {
        let settings = Settings::from_toml(toml).unwrap();
        let snowflake = MemoryWarehouse::new();
        let bigquery = MemoryWarehouse::new();
        let observer = CaptureObserver::new_with_handle();
        let session = Session::new(
            settings,
            vec![
                (Source::Snowflake, Box::new(snowflake.connector()) as Box<dyn Connector>),
                (Source::BigQuery, Box::new(bigquery.connector()) as Box<dyn Connector>),
            ],
            observer.clone(),
        );
        Self {
            session: RefCell::new(session),
            snowflake,
            bigquery,
            observer,
            tables: HashMap::new(),
        }
    }

    fn warehouse(&self, source: Source) -> &MemoryWarehouse {
        match source {
            Source::Snowflake => &self.snowflake,
            Source::BigQuery => &self.bigquery,
        }
    }

    /// Applies the function on the runner, typically to run a series of steps.
    pub(crate) fn bind<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&mut Self),
    {
        f(self);
        self
    }

    /// Inspects the session, e.g. its metrics logs.
    pub(crate) fn check<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&Session),
    {
        f(&*self.session.borrow());
        self
    }

    /// Makes `source` answer `query` with the table given in the expected
    /// output format (see `parse_table`), reporting `bytes` processed.
    pub(crate) fn respond(
        &mut self,
        source: Source,
        query: &str,
        table: &str,
        bytes: Option<u64>,
    ) -> &mut Self {
        let table = parse_table(table);
        let warehouse = self.warehouse(source);
        match bytes {
            Some(bytes) => warehouse.respond_with_bytes(query, table, bytes),
            None => warehouse.respond(query, table),
        };
        self
    }

    /// Runs `query` on `source` through the session and keeps the result as
    /// `name`.
    pub(crate) fn execute(&mut self, source: Source, query: &str, name: &str) -> &mut Self {
        let table = {
            let session = &mut self.session.borrow_mut();
            session.execute(source, query).unwrap()
        };
        self.tables.insert(name.to_string(), table);
        self
    }

    /// Joins two kept results and keeps the joined table as `name`.
    pub(crate) fn join(
        &mut self,
        left: &str,
        right: &str,
        keys: &[&str],
        outputs: &[&str],
        name: &str,
    ) -> &mut Self {
        let table = {
            let session = &mut self.session.borrow_mut();
            session
                .join(&self.tables[left], &self.tables[right], keys, outputs)
                .unwrap()
        };
        self.tables.insert(name.to_string(), table);
        self
    }

    /// Writes a kept result to `target` on Snowflake and checks the count.
    pub(crate) fn write(&mut self, name: &str, target: &str, expected_rows: u64) -> &mut Self {
        {
            let session = &mut self.session.borrow_mut();
            assert_eq!(session.write(&self.tables[name], target).unwrap(), expected_rows);
        }
        self
    }

    /// Verifies that a kept result matches the expected output.
    pub(crate) fn expect(&mut self, name: &str, expected: &str) -> &mut Self {
        handle(&self.tables[name], expected);
        self
    }

    /// Reads `SELECT * FROM target` from the Snowflake warehouse and verifies
    /// that it matches the expected output.
    pub(crate) fn select_expect(&mut self, target: &str, expected: &str) -> &mut Self {
        let table = self
            .snowflake
            .table(target)
            .unwrap_or_else(|| panic!("table {target} does not exist"));
        handle(&table, expected);
        self
    }
}

/// Parses a table from the expected output format:
/// - Lines are separated by a semicolon and elements of each line are
///   separated by a comma.
/// - The first line is the column names in order, e.g. order_id, amount
/// - Each subsequent line is a row, e.g. 1, 9.5. Values are inferred like CSV
///   cells, NULL is SQL NULL and a value in single quotes is kept as text.
pub fn parse_table(text: &str) -> ResultTable {
    let lines = text.split(';').map(str::trim).collect::<Vec<&str>>();
    let (header, rows) = lines.split_at(1);
    let names = header[0].split(',').map(str::trim).collect::<Vec<&str>>();
    let rows = rows
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(parse_value).collect())
        .collect();
    ResultTable::from_rows(&names, rows).unwrap()
}

fn parse_value(cell: &str) -> Value {
    let cell = cell.trim();
    if cell == "NULL" {
        return Value::Null;
    }
    match cell.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(text) => Value::from(text),
        None => Value::infer(cell),
    }
}

/// Checks that a table has the expected column names, in order, and exactly
/// the expected rows, in order.
pub fn handle(table: &ResultTable, expected: &str) {
    let lines = expected.split(';').map(str::trim).collect::<Vec<&str>>();
    let (expected_columns, expected_rows) = lines.split_at(1);
    let expected_rows: Vec<&str> = expected_rows
        .iter()
        .copied()
        .filter(|line| !line.is_empty())
        .collect();

    // Check that the output schema has expected column names and ordering.
    assert_eq!(
        table.column_names().join(", "),
        expected_columns[0].split(',').map(str::trim).join(", ")
    );
    // Check that the output rows match the expected rows.
    assert_eq!(table.row_count(), expected_rows.len());
    table
        .rows()
        .iter()
        .map(|r| r.to_string(None))
        .zip(expected_rows.iter())
        .for_each(|(row, expected_row)| {
            assert_eq!(&row, &expected_row.split(',').map(str::trim).join(", "))
        });
}

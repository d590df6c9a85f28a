//! An in-memory warehouse.
//!
//! Queries are answered from result sets registered up front (or loaded from
//! CSV extracts). The statements issued by the writer are executed for real:
//! `CREATE TABLE IF NOT EXISTS` creates a text-typed table and batched
//! `INSERT INTO ... VALUES (?, ...)` appends rows to it, and
//! `SELECT * FROM <table>` reads a created table back.
use super::{Connection, Connector, QueryOutcome};
use crate::common::{Error, Result};
use crate::config::SourceConfig;
use crate::storage::csv;
use crate::types::{Column, DataType, ResultTable, Row, Schema, Value};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^CREATE\s+TABLE\s+IF\s+NOT\s+EXISTS\s+(?P<table>(?:"(?:[^"]|"")*"|[^\s("])+)\s*\((?P<columns>.*)\)$"#)
        .expect("valid CREATE TABLE pattern")
});

static INSERT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^INSERT\s+INTO\s+(?P<table>(?:"(?:[^"]|"")*"|[^\s("])+)\s*\((?P<columns>(?:"(?:[^"]|"")*"|[^)"])*)\)\s*VALUES\s*\((?P<params>[^)]*)\)$"#,
    )
    .expect("valid INSERT pattern")
});

static SELECT_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^SELECT\s+\*\s+FROM\s+(?P<table>(?:"(?:[^"]|"")*"|[^\s"])+)$"#).expect("valid SELECT pattern")
});

#[derive(Default)]
struct State {
    responses: HashMap<String, QueryOutcome>,
    query_failures: HashMap<String, String>,
    connect_failure: Option<String>,
    write_failure: Option<String>,
    tables: BTreeMap<String, ResultTable>,
    statements: Vec<String>,
    batches: usize,
    opened: usize,
    closed: usize,
}

/// A shared, in-memory warehouse. Clones share the same state, so a test can
/// keep one clone for inspection while a session owns a connector.
#[derive(Clone, Default)]
pub struct MemoryWarehouse {
    state: Rc<RefCell<State>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `query` with `table`; the warehouse reports no volume.
    pub fn respond(&self, query: &str, table: ResultTable) -> &Self {
        self.respond_with(query, QueryOutcome::new(table, None))
    }

    /// Answers `query` with `table`, reporting `bytes` processed.
    pub fn respond_with_bytes(&self, query: &str, table: ResultTable, bytes: u64) -> &Self {
        self.respond_with(query, QueryOutcome::new(table, Some(bytes)))
    }

    fn respond_with(&self, query: &str, outcome: QueryOutcome) -> &Self {
        self.state
            .borrow_mut()
            .responses
            .insert(normalize(query), outcome);
        self
    }

    /// Answers `query` with the contents of a CSV extract. The extract's size
    /// on disk is reported as the processed volume.
    pub fn load_csv(&self, query: &str, path: &Path) -> Result<&Self> {
        let table = csv::read_table(path)?;
        let bytes = std::fs::metadata(path)?.len();
        Ok(self.respond_with_bytes(query, table, bytes))
    }

    /// Makes `query` fail with `Error::Query(message)`.
    pub fn fail_query(&self, query: &str, message: &str) -> &Self {
        self.state
            .borrow_mut()
            .query_failures
            .insert(normalize(query), message.to_string());
        self
    }

    /// Makes every subsequent connection attempt fail.
    pub fn fail_connect(&self, message: &str) -> &Self {
        self.state.borrow_mut().connect_failure = Some(message.to_string());
        self
    }

    /// Makes every subsequent DDL/DML statement fail.
    pub fn fail_writes(&self, message: &str) -> &Self {
        self.state.borrow_mut().write_failure = Some(message.to_string());
        self
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            warehouse: self.clone(),
        }
    }

    /// Returns a copy of a table created through `CREATE TABLE`.
    pub fn table(&self, name: &str) -> Option<ResultTable> {
        let key = unquote_qualified(name);
        self.state.borrow().tables.get(&key).cloned()
    }

    /// Every DDL/DML statement executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.borrow().statements.clone()
    }

    /// Number of `execute_batch` calls that succeeded.
    pub fn batch_count(&self) -> usize {
        self.state.borrow().batches
    }

    pub fn opened(&self) -> usize {
        self.state.borrow().opened
    }

    pub fn closed(&self) -> usize {
        self.state.borrow().closed
    }
}

/// Opens connections to a `MemoryWarehouse`.
pub struct MemoryConnector {
    warehouse: MemoryWarehouse,
}

impl Connector for MemoryConnector {
    fn connect(&self, config: &SourceConfig) -> Result<Box<dyn Connection>> {
        let mut state = self.warehouse.state.borrow_mut();
        if let Some(message) = &state.connect_failure {
            return Err(Error::Connection(message.clone()));
        }
        let missing = config.missing();
        if !missing.is_empty() {
            return Err(Error::Connection(format!(
                "{} authentication failed, missing: {}",
                config.source(),
                missing.join(", ")
            )));
        }
        state.opened += 1;
        Ok(Box::new(MemoryConnection {
            state: Rc::clone(&self.warehouse.state),
            open: true,
        }))
    }
}

struct MemoryConnection {
    state: Rc<RefCell<State>>,
    open: bool,
}

impl MemoryConnection {
    fn check_open(&self) -> Result<()> {
        match self.open {
            true => Ok(()),
            false => Err(Error::Connection("connection is closed".to_string())),
        }
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        match &self.state.borrow().write_failure {
            Some(message) => Err(Error::Query(message.clone())),
            None => Ok(()),
        }
    }
}

impl Connection for MemoryConnection {
    fn query(&mut self, sql: &str) -> Result<QueryOutcome> {
        self.check_open()?;
        let key = normalize(sql);
        let state = self.state.borrow();
        if let Some(message) = state.query_failures.get(&key) {
            return Err(Error::Query(message.clone()));
        }
        if let Some(outcome) = state.responses.get(&key) {
            return Ok(outcome.clone());
        }
        if let Some(captures) = SELECT_ALL.captures(&trim_statement(sql)) {
            let name = unquote_qualified(&captures["table"]);
            if let Some(table) = state.tables.get(&name) {
                return Ok(QueryOutcome::new(table.clone(), None));
            }
            return Err(Error::Query(format!("table '{name}' does not exist")));
        }
        Err(Error::Query(format!("no result registered for query: {key}")))
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.check_writable()?;
        let key = trim_statement(sql);
        let captures = CREATE_TABLE
            .captures(&key)
            .ok_or_else(|| Error::Query(format!("unsupported statement: {key}")))?;

        let name = unquote_qualified(&captures["table"]);
        let columns: Vec<Column> = split_unquoted(&captures["columns"], ',')
            .into_iter()
            .map(parse_column_definition)
            .collect::<Result<_>>()?;

        let mut state = self.state.borrow_mut();
        state.statements.push(key.clone());
        state
            .tables
            .entry(name)
            .or_insert_with(|| ResultTable::empty(Schema::new(columns)));
        Ok(0)
    }

    fn execute_batch(&mut self, sql: &str, params: &[Vec<Value>]) -> Result<u64> {
        self.check_writable()?;
        let key = trim_statement(sql);
        let captures = INSERT
            .captures(&key)
            .ok_or_else(|| Error::Query(format!("unsupported statement: {key}")))?;

        let name = unquote_qualified(&captures["table"]);
        let columns: Vec<String> = split_unquoted(&captures["columns"], ',')
            .into_iter()
            .map(unquote)
            .collect();
        let placeholders = captures["params"].split(',').map(str::trim).collect_vec();
        if placeholders.iter().any(|p| *p != "?") || placeholders.len() != columns.len() {
            return Err(Error::Query(format!(
                "expected one ? placeholder per column in: {key}"
            )));
        }

        let mut state = self.state.borrow_mut();
        let table = state
            .tables
            .get(&name)
            .ok_or_else(|| Error::Query(format!("table '{name}' does not exist")))?;
        let targets: Vec<usize> = columns
            .iter()
            .map(|c| {
                table
                    .schema()
                    .index_of(c)
                    .ok_or_else(|| Error::Query(format!("invalid identifier '{c}'")))
            })
            .collect::<Result<_>>()?;

        let width = table.col_count();
        let mut rows = Vec::with_capacity(params.len());
        for (i, values) in params.iter().enumerate() {
            if values.len() != targets.len() {
                return Err(Error::Query(format!(
                    "parameter row {i} binds {} values to {} columns",
                    values.len(),
                    targets.len()
                )));
            }
            let mut row = vec![Value::Null; width];
            for (value, &target) in values.iter().zip(&targets) {
                row[target] = value.clone();
            }
            rows.push(Row::from(row));
        }

        let count = rows.len() as u64;
        let (schema, mut existing) = state
            .tables
            .remove(&name)
            .map(ResultTable::into_parts)
            .unwrap_or_default();
        existing.extend(rows);
        state.tables.insert(name, ResultTable::new(schema, existing)?);
        state.statements.push(key);
        state.batches += 1;
        Ok(count)
    }

    fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.open = false;
        self.state.borrow_mut().closed += 1;
        Ok(())
    }
}

/// Collapses whitespace and drops trailing semicolons, so registered queries
/// match regardless of formatting.
fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .join(" ")
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

// DDL/DML is parsed as written; whitespace inside quoted names is significant.
fn trim_statement(sql: &str) -> String {
    sql.trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

/// Splits `text` on `separator`, ignoring separators inside double quotes.
fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut start, mut quoted) = (0, false);
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Resolves an identifier the way Snowflake does: quoted names are taken
/// literally, bare names are upper-cased.
fn unquote(identifier: &str) -> String {
    let trimmed = identifier.trim();
    match trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => trimmed.to_uppercase(),
    }
}

fn unquote_qualified(name: &str) -> String {
    split_unquoted(name, '.').into_iter().map(unquote).join(".")
}

// `"name" STRING` -> a text column called name
fn parse_column_definition(definition: &str) -> Result<Column> {
    let definition = definition.trim();
    let split = definition
        .rfind(char::is_whitespace)
        .ok_or_else(|| Error::Query(format!("invalid column definition '{definition}'")))?;
    let (name, data_type) = definition.split_at(split);
    match data_type.trim().to_ascii_uppercase().as_str() {
        "STRING" | "VARCHAR" | "TEXT" => Ok(Column::new(&unquote(name), DataType::Text)),
        other => Err(Error::Query(format!("unsupported column type '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("SELECT *\n  FROM t ;\n"), "SELECT * FROM t");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(" \"Order\"\"s\" "), "Order\"s");
        assert_eq!(unquote("plain"), "PLAIN");
        assert_eq!(unquote_qualified("\"db\".\"public\".\"t\""), "db.public.t");
        assert_eq!(unquote_qualified("db.\"Sales.EU\".t"), "DB.Sales.EU.T");
        assert_eq!(split_unquoted(r#""a,b" STRING, c STRING"#, ','), vec![r#""a,b" STRING"#, " c STRING"]);
    }

    #[test]
    fn test_parse_column_definition() {
        let column = parse_column_definition(" \"user id\" STRING").unwrap();
        assert_eq!(column.name(), "user id");
        assert_eq!(column.data_type(), DataType::Text);
        assert!(parse_column_definition("\"amount\" NUMBER").is_err());
        assert!(parse_column_definition("amount").is_err());
    }

    fn config() -> SourceConfig {
        SourceConfig::BigQuery(crate::config::BigQueryConfig {
            project: "acme-events".to_string(),
            credentials: "/etc/rustybridge/sa.json".to_string(),
        })
    }

    #[test]
    fn test_registered_responses() {
        let warehouse = MemoryWarehouse::new();
        let table = ResultTable::from_rows(&["id"], vec![vec![Value::from(1)]]).unwrap();
        warehouse
            .respond_with_bytes("SELECT id FROM events", table.clone(), 2048)
            .fail_query("SELECT id FROM secret", "Access Denied");
        let mut connection = warehouse.connector().connect(&config()).unwrap();

        let outcome = connection.query("SELECT id\nFROM events;").unwrap();
        assert_eq!(outcome, QueryOutcome::new(table, Some(2048)));
        assert_eq!(
            connection.query("SELECT id FROM secret").err(),
            Some(Error::Query("Access Denied".to_string()))
        );
        assert!(connection.query("SELECT 1").is_err());

        connection.close().unwrap();
        assert!(matches!(connection.query("SELECT id FROM events"), Err(Error::Connection(_))));
        assert_eq!((warehouse.opened(), warehouse.closed()), (1, 1));
    }

    #[test]
    fn test_create_insert_select() {
        let warehouse = MemoryWarehouse::new();
        let mut connection = warehouse.connector().connect(&config()).unwrap();

        connection
            .execute(r#"CREATE TABLE IF NOT EXISTS "t" ("a" STRING, "b" STRING)"#)
            .unwrap();
        let count = connection
            .execute_batch(
                r#"INSERT INTO "t" ("b", "a") VALUES (?, ?)"#,
                &[vec![Value::from("x"), Value::Null]],
            )
            .unwrap();
        assert_eq!(count, 1);

        let outcome = connection.query("SELECT * FROM \"t\"").unwrap();
        assert_eq!(outcome.table.value(0, "a"), Some(&Value::Null));
        assert_eq!(outcome.table.value(0, "b"), Some(&Value::from("x")));
        assert!(connection
            .execute_batch(r#"INSERT INTO "t" ("a") VALUES (?, ?)"#, &[])
            .is_err());
        assert!(connection
            .execute_batch(r#"INSERT INTO "missing" ("a") VALUES (?)"#, &[])
            .is_err());
    }

    #[test]
    fn test_quoted_names_with_spaces() {
        let warehouse = MemoryWarehouse::new();
        let mut connection = warehouse.connector().connect(&config()).unwrap();

        connection
            .execute(r#"CREATE TABLE IF NOT EXISTS "Page  Views" ("Order ID" STRING, "x,""y" STRING)"#)
            .unwrap();
        connection
            .execute_batch(
                r#"INSERT INTO "Page  Views" ("x,""y", "Order ID") VALUES (?, ?)"#,
                &[vec![Value::from("b"), Value::from("a")]],
            )
            .unwrap();

        let table = warehouse.table("\"Page  Views\"").unwrap();
        assert_eq!(table.column_names(), vec!["Order ID", "x,\"y"]);
        assert_eq!(table.value(0, "Order ID"), Some(&Value::from("a")));
        assert_eq!(table.value(0, "x,\"y"), Some(&Value::from("b")));
        assert!(warehouse.table("page_views").is_none());
    }

    #[test]
    fn test_connect_requires_credentials() {
        let warehouse = MemoryWarehouse::new();
        let config = SourceConfig::BigQuery(Default::default());
        let result = warehouse.connector().connect(&config);
        assert!(matches!(result, Err(Error::Connection(ref m)) if m.contains("project")));
        assert_eq!(warehouse.opened(), 0);
    }
}

use crate::common::{Error, Result};
use crate::errdata;
use crate::types::row::Row;
use crate::types::schema::{Column, DataType, Schema};
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The (rows, columns) dimensions of a result table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl Shape {
    pub fn new(rows: usize, columns: usize) -> Shape {
        Shape { rows, columns }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.columns)
    }
}

/// A fully materialized query result: ordered, typed columns and ordered rows.
///
/// Every row holds exactly one value per column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    schema: Schema,
    rows: Vec<Row>,
}

impl ResultTable {
    /// Creates a table, checking that every row matches the schema width.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<ResultTable> {
        let width = schema.col_count();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.size() != width) {
            return errdata!(
                "row {i} has {} values but the table has {width} columns",
                row.size()
            );
        }
        Ok(ResultTable { schema, rows })
    }

    /// Creates a table from column names and raw rows, inferring each
    /// column's type from its values.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> Result<ResultTable> {
        let schema = Schema::new(names.iter().map(|n| Column::from(n.as_ref())).collect());
        let mut table = ResultTable::new(schema, rows.into_iter().map(Row::from).collect())?;
        table.infer_types();
        Ok(table)
    }

    /// Sets each column's type from the values it holds.
    pub fn infer_types(&mut self) {
        for i in 0..self.schema.col_count() {
            let data_type =
                DataType::infer(self.rows.iter().filter_map(|row| row.get_value(i).ok()));
            self.schema.columns_mut()[i].set_data_type(data_type);
        }
    }

    pub fn empty(schema: Schema) -> ResultTable {
        ResultTable {
            schema,
            rows: vec![],
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_parts(self) -> (Schema, Vec<Row>) {
        (self.schema, self.rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.schema.col_count()
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.row_count(), self.col_count())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    /// Returns the value in row `row` of the first column named `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.schema.index_of(column)?;
        self.rows.get(row)?.get_value(index).ok()
    }

    /// Returns all values of the first column named `column`, top to bottom.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>> {
        let index = self
            .schema
            .index_of(column)
            .ok_or_else(|| Error::MissingColumn(vec![column.to_string()]))?;
        self.rows.iter().map(|row| row.get_value(index)).collect()
    }

    /// Counts rows that are exact duplicates of an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows.iter().filter(|row| !seen.insert(*row)).count()
    }

    /// True if any value in the table is NULL.
    pub fn has_nulls(&self) -> bool {
        self.rows.iter().any(|row| row.iter().any(Value::is_null))
    }

    /// Approximate in-memory size of the values, in bytes.
    pub fn memory_usage_bytes(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|value| {
                std::mem::size_of::<Value>()
                    + match value {
                        Value::String(s) => s.capacity(),
                        _ => 0,
                    }
            })
            .sum()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  [{}]", self.schema.names().join(", "))?;
        for row in &self.rows {
            writeln!(f, "  {}", row.to_string(None))?;
        }
        Ok(())
    }
}

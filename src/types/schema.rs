use crate::types::value::Value;
use core::ops::Deref;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    Date,
    Timestamp,
    Invalid,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "bool"),
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Text => write!(f, "varchar"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Invalid => write!(f, "invalid"),
        }
    }
}

impl DataType {
    /// Infers a column type from its values. NULLs are ignored; a column with
    /// no defined values, or with values of several types, is Invalid.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
        let types: Vec<DataType> = values
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| v.get_type())
            .unique()
            .collect();
        match types.as_slice() {
            [single] => *single,
            _ => DataType::Invalid,
        }
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    /// Column name, as returned by the source. Case is preserved.
    name: String,
    /// Column datatype. Invalid when the source did not report a usable type.
    data_type: DataType,
}

impl Column {
    pub fn new(name: &str, data_type: DataType) -> Column {
        Column {
            name: name.to_string(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.data_type)
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Column {
        Column::new(name, DataType::Invalid)
    }
}

/// The ordered column definitions of a result table.
///
/// Duplicate names are allowed, since a warehouse can return them (e.g.
/// `SELECT a.id, b.id`). Lookups by name resolve to the first occurrence.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Schema {
        Schema { columns }
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get_column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    // if a column exists return its offset in the schema
    // otherwise return None
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns the names in `wanted` that are not columns of this schema,
    /// preserving the order of `wanted`.
    pub fn missing<S: AsRef<str>>(&self, wanted: &[S]) -> Vec<String> {
        wanted
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Returns every column name that occurs more than once, once each, in
    /// order of first appearance.
    pub fn duplicated_names(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for column in &self.columns {
            *counts.entry(column.name()).or_default() += 1;
        }
        self.columns
            .iter()
            .map(|c| c.name())
            .filter(|name| counts[name] > 1)
            .unique()
            .map(str::to_string)
            .collect()
    }

    pub fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.columns.iter().join(", "))
    }
}

impl Deref for Schema {
    type Target = Vec<Column>;

    fn deref(&self) -> &Self::Target {
        &self.columns
    }
}

impl From<Vec<Column>> for Schema {
    fn from(columns: Vec<Column>) -> Schema {
        Schema::new(columns)
    }
}

impl From<&[&str]> for Schema {
    fn from(names: &[&str]) -> Schema {
        Schema::new(names.iter().map(|name| Column::from(*name)).collect())
    }
}

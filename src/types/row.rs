use crate::common::{Error, Result};
use crate::types::value::Value;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::slice::Iter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row { values }
    }
}

impl From<Vec<&Value>> for Row {
    fn from(values: Vec<&Value>) -> Self {
        Row {
            values: values.into_iter().cloned().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Row {
    pub fn iter(&self) -> Iter<Value> {
        self.values.iter()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn get_value(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or(Error::InvalidInput(format!(
            "column index {index} out of bounds for a row of {} values",
            self.values.len()
        )))
    }

    pub fn update_value(&mut self, index: usize, new: Value) -> Result<()> {
        let size = self.values.len();
        let value = self.values.get_mut(index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "column index {index} out of bounds for a row of {size} values"
            ))
        })?;
        *value = new;
        Ok(())
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Builds a new row from the values at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> Result<Row> {
        indices
            .iter()
            .map(|&i| self.get_value(i).cloned())
            .collect::<Result<Vec<_>>>()
            .map(Row::from)
    }

    pub fn to_string(&self, str_len: Option<usize>) -> String {
        self.values
            .iter()
            .map(|value| {
                let mut text = value.to_string();
                if let (Value::String(_), Some(len)) = (value, str_len) {
                    text = text.chars().take(len).collect();
                }
                text
            })
            .join(", ")
    }
}

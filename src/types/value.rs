use crate::common::constants::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::types::DataType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Timestamp layouts accepted when parsing text, tried in order.
const TIMESTAMP_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Lossless timestamp layout used for join keys.
const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// `007`, `-01`, `00.5`; but not `0`, `0.5` or `-0.25`
fn has_leading_zero(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// A single cell of a result table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(b), Value::Boolean(b2)) => b == b2,
            (Value::Integer(i), Value::Integer(i2)) => i == i2,
            // match on NaN as well as equality
            (Value::Float(f), Value::Float(f2)) => (f == f2) || (f.is_nan() && f2.is_nan()),
            (Value::String(s), Value::String(s2)) => s == s2,
            (Value::Date(d), Value::Date(d2)) => d == d2,
            (Value::Timestamp(t), Value::Timestamp(t2)) => t == t2,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => {
                if f.is_nan() {
                    0.hash(state);
                } else if *f == 0.0 {
                    // 0.0 and -0.0 compare equal, so they must hash equal.
                    0.0f64.to_bits().hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Timestamp(t) => t.hash(state),
        }
    }
}

// for use in sorting
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(b), Value::Boolean(b2)) => b.cmp(b2),
            (Value::Integer(i), Value::Integer(i2)) => i.cmp(i2),
            (Value::Float(f), Value::Float(f2)) => match (f.is_nan(), f2.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => f.partial_cmp(f2).unwrap_or(Ordering::Equal),
            },
            (Value::String(s), Value::String(s2)) => s.cmp(s2),
            (Value::Date(d), Value::Date(d2)) => d.cmp(d2),
            (Value::Timestamp(t), Value::Timestamp(t2)) => t.cmp(t2),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(b) => b.fmt(f),
            Self::Integer(integer) => integer.fmt(f),
            Self::Float(float) => float.fmt(f),
            Self::String(string) => f.write_str(string),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Value {
    pub fn get_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Invalid,
            Value::Boolean(_) => DataType::Bool,
            Value::Integer(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::Text,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    // cross-type ordering: Null < Boolean < Integer < Float < String < Date < Timestamp
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::Date(_) => 5,
            Value::Timestamp(_) => 6,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value is undefined (NULL or NaN).
    pub fn is_undefined(&self) -> bool {
        *self == Self::Null || matches!(self, Self::Float(f) if f.is_nan())
    }

    /// The text form written to a text-typed target column. NULL has no text
    /// form and stays NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// The representation compared when joining on this value.
    ///
    /// Every key is compared as text so that sources disagreeing on a key's
    /// type (`1` vs `"1"`) still match. Integral floats use integer form,
    /// so `1.0` matches `1`. Timestamps keep their fractional seconds, so
    /// only identical instants match. Undefined values (NULL, NaN) return
    /// None and never match anything.
    pub fn join_key(&self) -> Option<String> {
        if self.is_undefined() {
            return None;
        }
        match self {
            Value::Float(f) if *f == 0.0 => Some("0".to_string()),
            Value::Timestamp(ts) => Some(ts.format(TIMESTAMP_KEY_FORMAT).to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Infers a typed value from text, e.g. a cell of a CSV extract.
    ///
    /// Tries, in order: empty (NULL), integer, float, boolean, timestamp, date,
    /// and falls back to a string. Numbers with a leading zero (`007`) are
    /// identifiers, not numbers, and stay strings.
    pub fn infer(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if has_leading_zero(trimmed) {
            return Value::String(text.to_string());
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if !trimmed.eq_ignore_ascii_case("nan") && !trimmed.to_ascii_lowercase().contains("inf") {
                return Value::Float(f);
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => {}
        }
        if let Some(ts) = Self::parse_timestamp(trimmed) {
            return Value::Timestamp(ts);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Value::Date(date);
        }
        Value::String(text.to_string())
    }

    pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
        TIMESTAMP_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    pub fn test_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Integer(1), Value::String("1".to_string()));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    pub fn test_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(Value::Float(0.0));
        set.insert(Value::Float(-0.0));
        set.insert(Value::Float(f64::NAN));
        set.insert(Value::Float(f64::NAN));
        assert_eq!(set.len(), 2);
    }

    #[test]
    pub fn test_ordering() {
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Integer(10) > Value::Integer(7));
        assert!(Value::Float(10.0) > Value::Float(7.0));
        assert!(Value::Integer(1000) < Value::String("a".to_string()));

        let mut values = vec![Value::from("b"), Value::Null, Value::from(3), Value::from("a")];
        values.sort();
        assert_eq!(
            values,
            vec![Value::Null, Value::from(3), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    pub fn test_join_key() {
        assert_eq!(Value::Integer(1).join_key(), Value::from("1").join_key());
        assert_eq!(Value::Float(1.0).join_key(), Some("1".to_string()));
        assert_eq!(Value::Float(-0.0).join_key(), Some("0".to_string()));
        assert_eq!(Value::Float(2.5).join_key(), Some("2.5".to_string()));
        assert_eq!(Value::Boolean(true).join_key(), Some("true".to_string()));
        assert_eq!(Value::Null.join_key(), None);
        assert_eq!(Value::Float(f64::NAN).join_key(), None);
        assert_eq!(
            Value::Timestamp(ts("2024-03-01 12:30:00")).join_key(),
            Some("2024-03-01 12:30:00".to_string())
        );
        let fractional =
            NaiveDateTime::parse_from_str("2024-03-01 12:30:00.100", "%Y-%m-%d %H:%M:%S%.f")
                .unwrap();
        assert_eq!(
            Value::Timestamp(fractional).join_key(),
            Some("2024-03-01 12:30:00.100".to_string())
        );
        assert_ne!(
            Value::Timestamp(fractional).join_key(),
            Value::Timestamp(ts("2024-03-01 12:30:00")).join_key()
        );
        // the written text form keeps the fixed layout
        assert_eq!(
            Value::Timestamp(fractional).to_text(),
            Some("2024-03-01 12:30:00".to_string())
        );
    }

    #[test]
    pub fn test_to_text() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::from(42).to_text(), Some("42".to_string()));
        assert_eq!(
            Value::from(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).to_text(),
            Some("2024-01-31".to_string())
        );
    }

    #[test]
    pub fn test_infer() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("  "), Value::Null);
        assert_eq!(Value::infer("42"), Value::Integer(42));
        assert_eq!(Value::infer("-3.5"), Value::Float(-3.5));
        assert_eq!(Value::infer("TRUE"), Value::Boolean(true));
        assert_eq!(Value::infer("nan"), Value::String("nan".to_string()));
        assert_eq!(
            Value::infer("2024-03-01 12:30:00"),
            Value::Timestamp(ts("2024-03-01 12:30:00"))
        );
        assert_eq!(
            Value::infer("2024-03-01T12:30:00.250"),
            Value::Timestamp(
                NaiveDateTime::parse_from_str("2024-03-01 12:30:00.250", "%Y-%m-%d %H:%M:%S%.f")
                    .unwrap()
            )
        );
        assert_eq!(
            Value::infer("2024-03-01"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(Value::infer("Add to Cart"), Value::from("Add to Cart"));
    }

    #[test]
    pub fn test_infer_leading_zeros() {
        assert_eq!(Value::infer("007"), Value::from("007"));
        assert_eq!(Value::infer("-01"), Value::from("-01"));
        assert_eq!(Value::infer("00.5"), Value::from("00.5"));
        assert_eq!(Value::infer("0"), Value::Integer(0));
        assert_eq!(Value::infer("0.5"), Value::Float(0.5));
        assert_eq!(Value::infer("-0.25"), Value::Float(-0.25));
        assert_eq!(Value::infer("007").join_key(), Value::from("007").join_key());
    }

    #[test]
    pub fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}

use std::ops::Deref;

/// An append-only, insertion-ordered sequence of records.
///
/// Records can be added but never changed or removed; readers get a slice
/// snapshot through `records` (or deref).
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsLog<T> {
    records: Vec<T>,
}

impl<T> Default for MetricsLog<T> {
    fn default() -> Self {
        Self { records: vec![] }
    }
}

impl<T> MetricsLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }
}

impl<T> Deref for MetricsLog<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = MetricsLog::new();
        assert!(log.is_empty());
        log.append("first");
        log.append("second");

        assert_eq!(log.len(), 2);
        assert_eq!(log.records(), &["first", "second"]);
        assert_eq!(log.last(), Some(&"second"));
    }
}

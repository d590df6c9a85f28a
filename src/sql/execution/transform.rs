use crate::common::{Error, Result};
use crate::types::{ResultTable, Row, Schema};
use itertools::Itertools as _;

/// Projects a table to the given columns, in the given order. A name that
/// occurs several times in the table resolves to its first occurrence. All
/// absent names are reported together.
pub fn project<S: AsRef<str>>(table: &ResultTable, columns: &[S]) -> Result<ResultTable> {
    let missing = table.schema().missing(columns);
    if !missing.is_empty() {
        return Err(Error::MissingColumn(missing.into_iter().unique().collect()));
    }
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| table.schema().index_of(name.as_ref()))
        .collect();

    let schema = Schema::new(
        indices
            .iter()
            .map(|&i| table.schema().get_column(i).clone())
            .collect(),
    );
    let rows = table
        .rows()
        .iter()
        .map(|row| row.project(&indices))
        .collect::<Result<Vec<Row>>>()?;
    ResultTable::new(schema, rows)
}

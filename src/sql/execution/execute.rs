use crate::common::constants::BYTES_PER_MB;
use crate::common::{Observer, Result};
use crate::config::CostRates;
use crate::metrics::record::now;
use crate::metrics::{ImportRecord, MetricsLog};
use crate::sql::engine::{ConnectionManager, QueryOutcome, Source};
use crate::types::ResultTable;
use std::time::Instant;

/// Runs a query on `source` and returns its complete result.
///
/// The elapsed time covers acquiring the connection and running the query.
/// On success one import record is appended to `imports`; when the source
/// reports the processed volume, the record carries the volume in MB and a
/// cost estimated with the source's per-byte rate. Failures are reported to
/// the observer and returned without a record.
pub fn execute_query(
    connections: &mut ConnectionManager,
    source: Source,
    query: &str,
    rates: &CostRates,
    imports: &mut MetricsLog<ImportRecord>,
    observer: &dyn Observer,
) -> Result<ResultTable> {
    observer.info(&format!("Executing query on {source}..."));
    let start = Instant::now();

    let outcome = match run(connections, source, query) {
        Ok(outcome) => outcome,
        Err(err) => {
            observer.error(&format!("Error while querying {source}: {err}"));
            return Err(err);
        }
    };
    let elapsed_secs = start.elapsed().as_secs_f64();

    let table = outcome.table;
    let data_mb = outcome.bytes_processed.map(|b| b as f64 / BYTES_PER_MB);
    let cost_eur = outcome
        .bytes_processed
        .map(|b| b as f64 * rates.rate(source));

    let record = ImportRecord {
        source,
        query: query.to_string(),
        rows: table.row_count(),
        columns: table.col_count(),
        data_mb,
        cost_eur,
        elapsed_secs,
        timestamp: now(),
    };
    observer.info(&summary(&record));
    imports.append(record);

    Ok(table)
}

fn run(connections: &mut ConnectionManager, source: Source, query: &str) -> Result<QueryOutcome> {
    let handle = connections.get_connection(source)?;
    let mut connection = handle.borrow_mut();
    connection.query(query)
}

fn summary(record: &ImportRecord) -> String {
    let data = match record.data_mb {
        Some(mb) => format!("{mb:.2} MB"),
        None => "n/a".to_string(),
    };
    let cost = match record.cost_eur {
        Some(eur) => format!("{eur:.4} EUR"),
        None => "n/a".to_string(),
    };
    format!(
        "{}: Rows={}, Columns={}, Data={data}, Cost={cost}, Time={:.2} seconds.",
        record.source, record.rows, record.columns, record.elapsed_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut record = ImportRecord {
            source: Source::BigQuery,
            query: "SELECT 1".to_string(),
            rows: 12,
            columns: 3,
            data_mb: Some(1.5),
            cost_eur: Some(7.3138),
            elapsed_secs: 0.256,
            timestamp: now(),
        };
        assert_eq!(
            summary(&record),
            "BigQuery: Rows=12, Columns=3, Data=1.50 MB, Cost=7.3138 EUR, Time=0.26 seconds."
        );

        record.data_mb = None;
        record.cost_eur = None;
        assert_eq!(
            summary(&record),
            "BigQuery: Rows=12, Columns=3, Data=n/a, Cost=n/a, Time=0.26 seconds."
        );
    }
}

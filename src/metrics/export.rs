use crate::common::{Error, Result};
use crate::metrics::record::{CsvRecord, ImportRecord};
use crate::storage::csv::write_records;
use hdrhistogram::Histogram;
use std::path::Path;

/// Writes records to a CSV file with the record type's header, replacing
/// any existing file.
pub fn export<T: CsvRecord>(records: &[T], path: &Path) -> Result<()> {
    write_records(path, T::HEADER, records.iter().map(CsvRecord::to_record))
}

/// Query latency percentiles over a set of import records, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencySummary {
    pub count: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
}

/// Summarizes query latencies. Returns None for an empty slice.
pub fn latency_summary(records: &[ImportRecord]) -> Result<Option<LatencySummary>> {
    if records.is_empty() {
        return Ok(None);
    }
    let mut histogram = Histogram::<u64>::new(3)
        .map_err(|e| Error::InvalidData(format!("latency histogram: {e}")))?;
    for record in records {
        let ms = (record.elapsed_secs * 1000.0).round().max(0.0) as u64;
        histogram
            .record(ms)
            .map_err(|e| Error::InvalidData(format!("latency histogram: {e}")))?;
    }
    Ok(Some(LatencySummary {
        count: histogram.len(),
        p50_ms: histogram.value_at_quantile(0.5),
        p95_ms: histogram.value_at_quantile(0.95),
        max_ms: histogram.max(),
    }))
}

/// Sum of the estimated costs; records without a cost count as zero.
pub fn total_cost_eur(records: &[ImportRecord]) -> f64 {
    records.iter().filter_map(|r| r.cost_eur).sum()
}

//! CSV bar loader.
//!
//! Record layout is positional: `Date,Open,High,Low,Close,Volume` with a
//! header row that is skipped. The date column is discarded. Malformed
//! records are skipped with a warning instead of failing the whole load.

use std::fs::File;
use std::io::Read;
use std::time::Instant;

use tracing::{debug, warn};

use stds_core::bar::Bar;

/// Load a bar series from the CSV file at `path`.
///
/// Fails when the file cannot be opened or yields no valid bar records.
pub fn load_bars(path: &str) -> Result<Vec<Bar>, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let file = File::open(path).map_err(|e| format!("cannot open {path}: {e}"))?;
    let bars = read_bars(file)?;
    if bars.is_empty() {
        return Err(format!("no valid bar records in {path}").into());
    }
    debug!(
        path,
        bars = bars.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "csv load complete"
    );
    Ok(bars)
}

/// Read bars from any CSV source with a header row.
///
/// Returns every record that parses; the caller decides whether an empty
/// result is an error.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, Box<dyn std::error::Error>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in csv_reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                warn!(row, error = %e, "skipping unreadable record");
                continue;
            }
        };

        match parse_record(&record) {
            Some(bar) => bars.push(bar),
            None => {
                skipped += 1;
                warn!(row, record = %record.as_slice(), "skipping malformed bar record");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = bars.len(), "bar records skipped during load");
    }
    Ok(bars)
}

/// Parse one positional record; the leading date field is ignored.
fn parse_record(record: &csv::StringRecord) -> Option<Bar> {
    if record.len() < 6 {
        return None;
    }
    Some(Bar {
        open: record.get(1)?.parse().ok()?,
        high: record.get(2)?.parse().ok()?,
        low: record.get(3)?.parse().ok()?,
        close: record.get(4)?.parse().ok()?,
        volume: record.get(5)?.parse().ok()?,
    })
}

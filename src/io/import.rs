//! CSV import of a `timestamp,power_W` corpus.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::PipelineError;
use crate::sim::types::PowerSample;

/// Loads a power trace from a CSV file.
///
/// # Errors
///
/// See [`read_samples_csv`]; also `Io` if the file cannot be opened.
pub fn load_samples_csv(path: &Path) -> Result<Vec<PowerSample>, PipelineError> {
    let file = File::open(path)?;
    let samples = read_samples_csv(file)?;
    debug!(path = %path.display(), samples = samples.len(), "loaded trace");
    Ok(samples)
}

/// Reads a power trace with a `timestamp,power_W` header.
///
/// Timestamps must parse as RFC 3339 and increase strictly; readings must be
/// finite and non-negative. Rows are numbered from 1, header excluded.
///
/// # Errors
///
/// `InvalidData` for the first offending row; `Csv` for I/O failures while
/// reading.
pub fn read_samples_csv(reader: impl Read) -> Result<Vec<PowerSample>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples: Vec<PowerSample> = Vec::new();
    for (idx, record) in rdr.deserialize::<PowerSample>().enumerate() {
        let row = idx + 1;
        let sample = match record {
            Ok(s) => s,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                return Err(PipelineError::InvalidData {
                    row,
                    reason: e.to_string(),
                });
            }
        };

        if !sample.power_w.is_finite() || sample.power_w < 0.0 {
            return Err(PipelineError::InvalidData {
                row,
                reason: format!("power_W must be finite and >= 0, got {}", sample.power_w),
            });
        }
        if let Some(prev) = samples.last() {
            if sample.timestamp <= prev.timestamp {
                return Err(PipelineError::InvalidData {
                    row,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        sample.timestamp, prev.timestamp
                    ),
                });
            }
        }
        samples.push(sample);
    }
    Ok(samples)
}

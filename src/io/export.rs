//! CSV export for power traces and forecasts.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use super::{FORECAST_HEADER, SAMPLE_HEADER};
use crate::pipeline::ForecastOutput;
use crate::sim::types::PowerSample;

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Exports a power trace to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_samples_csv(samples: &[PowerSample], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_samples_csv(samples, io::BufWriter::new(file))
}

/// Writes a power trace as `timestamp,power_W` rows to any writer.
///
/// Timestamps are RFC 3339 in UTC. Readings use the shortest form that
/// parses back to the same `f64`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_samples_csv(samples: &[PowerSample], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SAMPLE_HEADER)?;
    for s in samples {
        wtr.write_record(&[format_timestamp(&s.timestamp), s.power_w.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports a forecast to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_forecast_csv(forecast: &ForecastOutput, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_forecast_csv(forecast, io::BufWriter::new(file))
}

/// Writes a forecast as `step,timestamp,power_W` rows, `step` counting
/// from 1.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_forecast_csv(forecast: &ForecastOutput, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FORECAST_HEADER)?;
    for (i, (ts, w)) in forecast.timestamps.iter().zip(&forecast.values_w).enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            format_timestamp(ts),
            format!("{w:.4}"),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaler::ScaleParams;
    use chrono::TimeDelta;

    fn make_trace(n: usize) -> Vec<PowerSample> {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        (0..n)
            .map(|i| PowerSample::new(t0 + TimeDelta::seconds(i as i64), i as f64 * 1.5))
            .collect()
    }

    #[test]
    fn samples_header_and_rows() {
        let mut buf = Vec::new();
        write_samples_csv(&make_trace(3), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,power_W");
        assert_eq!(lines[1], "1970-01-01T00:00:00Z,0");
        assert_eq!(lines[3], "1970-01-01T00:00:02Z,3");
    }

    #[test]
    fn recorded_readings_keep_full_precision() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let trace = vec![
            PowerSample::new(t0, 12.345_678_9),
            PowerSample::new(t0 + TimeDelta::seconds(1), 0.1 + 0.2),
        ];
        let mut buf = Vec::new();
        write_samples_csv(&trace, &mut buf).unwrap();
        let back = crate::io::import::read_samples_csv(buf.as_slice()).unwrap();
        assert_eq!(back, trace);
    }

    #[test]
    fn forecast_steps_count_from_one() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let forecast = ForecastOutput {
            values_w: vec![1000.0, 0.0],
            timestamps: vec![t0, t0 + TimeDelta::seconds(1)],
            params: ScaleParams { min: 0.0, max: 1000.0 },
        };
        let mut buf = Vec::new();
        write_forecast_csv(&forecast, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines[0], "step,timestamp,power_W");
        assert_eq!(lines[1], "1,1970-01-01T00:00:00Z,1000.0000");
        assert_eq!(lines[2], "2,1970-01-01T00:00:01Z,0.0000");
    }

    #[test]
    fn deterministic_output() {
        let trace = make_trace(10);
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_samples_csv(&trace, &mut buf1).ok();
        write_samples_csv(&trace, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}

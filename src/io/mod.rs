pub mod export;
pub mod import;

/// Column header of the corpus table.
pub const SAMPLE_HEADER: [&str; 2] = ["timestamp", "power_W"];

/// Column header of the forecast table.
pub const FORECAST_HEADER: [&str; 3] = ["step", "timestamp", "power_W"];

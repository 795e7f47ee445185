//! Household power-trace simulator and rolling multi-step forecast pipeline.

pub mod config;
pub mod devices;
pub mod error;
pub mod forecast;
/// CSV import and export of power traces and forecasts.
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod scaler;
/// Synthetic trace generation.
pub mod sim;
pub mod window;

#[cfg(feature = "api")]
pub mod api;

pub use error::PipelineError;

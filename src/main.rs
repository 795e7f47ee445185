//! power-forecast entry point: CLI wiring and config-driven pipeline run.

mod cli;

use std::fmt::Display;
use std::path::Path;
use std::process;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use power_forecast::config::PipelineConfig;
use power_forecast::io::export::{export_forecast_csv, export_samples_csv};
use power_forecast::io::import::load_samples_csv;
use power_forecast::pipeline;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "power_forecast=info".into()),
        )
        .init();
}

fn fail(msg: impl Display) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

fn main() {
    let cli = cli::parse_args().unwrap_or_else(|e| {
        cli::print_usage();
        fail(e)
    });
    init_tracing();

    // --config takes priority, then --preset, then the household default
    let mut config = if let Some(ref path) = cli.config {
        PipelineConfig::from_toml_file(path).unwrap_or_else(|e| fail(e))
    } else if let Some(ref name) = cli.preset {
        PipelineConfig::from_preset(name).unwrap_or_else(|e| fail(e))
    } else {
        PipelineConfig::household()
    };

    if let Some(seed) = cli.seed {
        config.trace.seed = Some(seed);
    }
    if let Some(ref name) = cli.predictor {
        config.forecast.predictor = name.clone();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let trace = match cli.input {
        Some(ref path) => load_samples_csv(path),
        None => pipeline::generate_trace(&config),
    }
    .unwrap_or_else(|e| fail(e));
    info!(samples = trace.len(), "trace ready");

    if let Some(ref path) = cli.trace_out {
        if let Err(e) = export_samples_csv(&trace, path) {
            fail(format!("failed to write trace CSV: {e}"));
        }
        info!(path = %path.display(), "trace written");
    }

    let report = pipeline::run(&config, &trace).unwrap_or_else(|e| fail(e));
    println!("{report}");

    if let Some(ref path) = cli.forecast_out {
        write_forecast(&report.forecast, path);
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(power_forecast::api::AppState {
            config,
            trace,
            report,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(power_forecast::api::serve(state, addr)) {
            fail(format!("API server on {addr}: {e}"));
        }
    }
}

fn write_forecast(forecast: &pipeline::ForecastOutput, path: &Path) {
    if let Err(e) = export_forecast_csv(forecast, path) {
        fail(format!("failed to write forecast CSV: {e}"));
    }
    info!(path = %path.display(), steps = forecast.len(), "forecast written");
}

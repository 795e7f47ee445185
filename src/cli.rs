use std::env;
use std::path::PathBuf;

/// Parsed command-line options.
#[derive(Debug)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub seed: Option<u64>,
    pub input: Option<PathBuf>,
    pub trace_out: Option<PathBuf>,
    pub forecast_out: Option<PathBuf>,
    pub predictor: Option<String>,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: u16,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        config: None,
        preset: None,
        seed: None,
        input: None,
        trace_out: None,
        forecast_out: None,
        predictor: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args
                    .next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                set_once(&mut opts.config, PathBuf::from(path), "--config")?;
            }
            "--preset" => {
                i += 1;
                let name = args
                    .next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                set_once(&mut opts.seed, seed, "--seed")?;
            }
            "--input" => {
                i += 1;
                let path = args
                    .next_or_err(i, "missing value for --input (expected a CSV file path)")?;
                set_once(&mut opts.input, PathBuf::from(path), "--input")?;
            }
            "--trace-out" => {
                i += 1;
                let path = args
                    .next_or_err(i, "missing value for --trace-out (expected a file path)")?;
                set_once(&mut opts.trace_out, PathBuf::from(path), "--trace-out")?;
            }
            "--forecast-out" => {
                i += 1;
                let path = args
                    .next_or_err(i, "missing value for --forecast-out (expected a file path)")?;
                set_once(&mut opts.forecast_out, PathBuf::from(path), "--forecast-out")?;
            }
            "--predictor" => {
                i += 1;
                let name = args
                    .next_or_err(i, "missing value for --predictor (expected a predictor name)")?;
                set_once(&mut opts.predictor, name.to_string(), "--predictor")?;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                opts.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                opts.port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("power-forecast: household power trace simulator and rolling forecaster");
    eprintln!();
    eprintln!("Usage: power-forecast [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>         Load pipeline config from a TOML file");
    eprintln!("  --preset <name>         Use a built-in preset (household, heater)");
    eprintln!("  --seed <u64>            Override the trace seed");
    eprintln!("  --input <path>          Forecast a recorded timestamp,power_W CSV");
    eprintln!("  --trace-out <path>      Write the trace to CSV");
    eprintln!("  --forecast-out <path>   Write the forecast to CSV");
    eprintln!("  --predictor <name>      Baseline predictor (persistence, drift, repeat)");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                 Start the REST API after the run");
        eprintln!("  --port <u16>            API server port (default: 3000)");
    }
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the household preset is used.");
    eprintln!("Set RUST_LOG to adjust logging (default: power_forecast=info).");
}

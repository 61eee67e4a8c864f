//! shelf_analyze - run shelf layout analysis over detector output files
//!
//! Each input is a JSON `AnalysisRequest`:
//! `{"image_width": 640, "image_height": 480, "detections": [...]}`.
//! Reports are written to stdout as JSON (an array when several inputs are given).

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use shelf_layout::config::ThresholdStrategy;
use shelf_layout::{analyze_batch, AnalysisConfig, AnalysisRequest};

#[derive(Parser, Debug)]
#[command(
    name = "shelf_analyze",
    version,
    about = "Infer shelf rows, columns and layout from object detections"
)]
struct Args {
    /// Request JSON files; `-` reads one request from stdin
    #[arg(
        long,
        value_name = "FILE",
        num_args = 1..,
        required_unless_present = "print_config"
    )]
    input: Vec<String>,

    /// Config file (JSON, or TOML by extension)
    #[arg(long, value_name = "FILE", env = "SHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Row clustering strategy override (fixed|statistical)
    #[arg(long, value_name = "STRATEGY")]
    row_strategy: Option<String>,

    /// Column clustering strategy override (fixed|statistical)
    #[arg(long, value_name = "STRATEGY")]
    column_strategy: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AnalysisConfig::load_from(args.config.as_deref())?;
    if let Some(strategy) = args.row_strategy.as_deref() {
        config.rows.strategy = strategy.parse::<ThresholdStrategy>()?;
    }
    if let Some(strategy) = args.column_strategy.as_deref() {
        config.columns.strategy = strategy.parse::<ThresholdStrategy>()?;
    }
    config.validate()?;

    if args.print_config {
        println!("{}", to_json(&config, args.pretty)?);
        return Ok(());
    }

    let requests = args
        .input
        .iter()
        .map(|source| read_request(source))
        .collect::<Result<Vec<_>>>()?;
    log::info!("analyzing {} request(s)", requests.len());

    let mut reports = Vec::with_capacity(requests.len());
    for (source, result) in args.input.iter().zip(analyze_batch(&requests, &config)) {
        let report = result.map_err(|e| anyhow!("{}: {}", source, e))?;
        reports.push(report);
    }

    let out = match reports.as_slice() {
        [single] => to_json(single, args.pretty)?,
        _ => to_json(&reports, args.pretty)?,
    };
    println!("{}", out);
    Ok(())
}

fn read_request(source: &str) -> Result<AnalysisRequest> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read request file {}", source))?
    };
    serde_json::from_str(&raw).with_context(|| format!("invalid request JSON in {}", source))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

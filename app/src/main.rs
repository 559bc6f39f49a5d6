use std::io::Write;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use geomesh::cli::{expand_globs, Cli};
use geomesh::config::AppConfig;
use geomesh::pipeline::Pipeline;

fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match AppConfig::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logger(LevelFilter::Info);
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    // resolve() has already validated the level
    init_logger(config.level_filter().unwrap_or(LevelFilter::Info));

    log::info!("input files: {:?}", args.input);
    log::info!("output folder: {}", args.output.display());

    let inputs = expand_globs(&args.input);
    if inputs.is_empty() {
        log::error!("No input files matched {:?}", args.input);
        return ExitCode::FAILURE;
    }

    let start = std::time::Instant::now();
    let mut pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = match pipeline.run(&inputs, &args.output) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Processed {} of {} inputs in {:?}",
        summary.outputs.len(),
        inputs.len(),
        start.elapsed()
    );

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize summary: {}", e),
    }

    if summary.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use gimbal_vision::{init_logging, Pipeline, PipelineConfig};
use log::LevelFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Turret auto-aiming: frames in, gimbal commands out.
#[derive(Debug, Parser)]
#[command(name = "gimbal-vision", version, about)]
struct Cli {
    /// JSON configuration; missing keys take their defaults.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Emit JSON log lines (needs the `tracing` feature).
    #[arg(long)]
    json_logs: bool,

    /// Write the default configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    dump_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.into(), cli.json_logs);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = cli.dump_config {
        PipelineConfig::default().write_json(&path)?;
        println!("wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };
    let summary = Pipeline::new(config)?.run()?;
    println!(
        "frames: {} acquired, {} processed, {} dropped; commands sent: {}",
        summary.frames_acquired,
        summary.frames_processed,
        summary.frames_dropped,
        summary.commands_sent
    );
    Ok(())
}

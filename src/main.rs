use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use paramon::LogLevel;
use paramon::agent;
use paramon::core::config::{self, CliOverrides};
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "paramon", about = "Clipboard validation agent for paragraph copy drills")]
struct Args {
    /// Pipe the controller writes commands to
    #[arg(long)]
    inbound: Option<PathBuf>,

    /// Pipe this agent writes results to
    #[arg(long)]
    outbound: Option<PathBuf>,

    /// Config file (defaults to ~/.paramon/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to ~/.paramon/paramon.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Disable the Alt/Option + arrow navigation hotkeys
    #[arg(long)]
    no_navigation_hotkeys: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("paramon: {e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            inbound: args.inbound,
            outbound: args.outbound,
            log_file: args.log_file,
            log_level: args.log_level,
            disable_navigation_hotkeys: args.no_navigation_hotkeys,
        },
    );

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Some(parent) = resolved.log_file.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match File::create(&resolved.log_file) {
        Ok(log_file) => {
            let _ = WriteLogger::init(resolved.log_level.into(), log_config, log_file);
        }
        Err(e) => eprintln!(
            "paramon: cannot open log file {}: {e}",
            resolved.log_file.display()
        ),
    }

    log::info!(
        "Paramon starting up (inbound {}, outbound {})",
        resolved.endpoints.inbound.display(),
        resolved.endpoints.outbound.display()
    );

    match agent::run(resolved) {
        Ok(()) => {
            log::info!("Paramon stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("paramon: {e}");
            ExitCode::FAILURE
        }
    }
}

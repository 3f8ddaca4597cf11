//! gitsu CLI — wires `configure -> resolve -> dissect -> install` together
//! for local filesystem-sourced components.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod app;
mod commands;
mod prompt;

use clap::Parser;
use commands::{Cli, Commands};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let filter = EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).without_time().init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    let result = match &cli.command {
        Commands::Install(args) => runtime.block_on(app::run(&cli, args, false)),
        Commands::Update(args) => runtime.block_on(app::run(&cli, args, true)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gitsu: {e}");
            ExitCode::FAILURE
        }
    }
}

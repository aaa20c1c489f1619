//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into config structs
//! - runs the cleaning pipeline, training, resolution or the HTTP service
//! - prints reports

use std::sync::Arc;

use clap::Parser;

use crate::cli::{CleanArgs, Command, ResolveArgs, ServeArgs, TrainArgs};
use crate::domain::{CleanConfig, ServiceConfig, TrainConfig};
use crate::error::AppError;
use crate::io::table::Table;
use crate::resolve::BuildingDirectory;
use crate::serve::PredictionService;

pub mod pipeline;

/// Entry point for the `be` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; everything has a flag or a default.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Clean(args) => handle_clean(&args),
        Command::Train(args) => handle_train(&args),
        Command::Resolve(args) => handle_resolve(&args),
        Command::Serve(args) => handle_serve(&args),
    }
}

fn handle_clean(args: &CleanArgs) -> Result<(), AppError> {
    let config = CleanConfig::from(args);
    let summary = pipeline::run_clean(&config)?;
    println!("{}", crate::report::format_clean_summary(&summary));
    Ok(())
}

fn handle_train(args: &TrainArgs) -> Result<(), AppError> {
    let config = TrainConfig::from(args);
    let predict = args.predict.as_ref().map(|input| (input, &args.out));
    let trained = pipeline::run_train(&config, predict)?;

    if !args.no_eval {
        println!("{}", crate::report::format_train_summary(&trained, &config));
    }
    Ok(())
}

fn handle_resolve(args: &ResolveArgs) -> Result<(), AppError> {
    let path = args.merged.path();
    if !path.is_file() {
        return Err(AppError::missing_file(format!(
            "Missing {}. Build it with: be clean",
            path.display()
        )));
    }
    let directory = BuildingDirectory::from_merged(&Table::read_csv(&path)?)?;
    let codes = directory.resolve(&args.name, args.allow_multiple)?;
    println!("{}", crate::report::format_resolution(&args.name, &codes));
    Ok(())
}

fn handle_serve(args: &ServeArgs) -> Result<(), AppError> {
    let config = ServiceConfig::from(args);
    let service = Arc::new(PredictionService::from_config(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::internal(format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::serve::http::serve(service, &config.host, config.port))
}

mod catalog;
mod config;
mod fusion;
mod propagate;
mod refresh;
mod web;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::process::ExitCode;

use crate::catalog::FeedSource;
use crate::config::Config;
use crate::propagate::{BatchPropagator, Sgp4Model};
use crate::refresh::{FetchScope, PassTrigger, Pipeline};

#[derive(Parser)]
#[command(name = "sat-fusion")]
#[command(about = "Merged orbital catalogs, propagated to live positions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the refresh scheduler and HTTP API
    Serve { config: String },
    /// Validate a config file
    Validate { config: String },
    /// Fetch once, run a single pass and print the result
    Propagate {
        config: String,
        /// Target instant (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Print the full position set as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Validate { config } => validate(&config),
        Commands::Propagate { config, at, json } => propagate(&config, at, json).await,
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid ({} groups)", config.groups.len());
    for group in &config.groups {
        println!(
            "  {} [{}, rank {}]{} <- {}",
            group.id,
            group.category,
            group.category.rank(),
            if group.enabled { "" } else { " (disabled)" },
            group.source
        );
    }
    println!(
        "  chunk size {}, fetch every {}",
        config.pipeline.chunk_size,
        humantime::format_duration(config.pipeline.fetch_interval)
    );
    ExitCode::SUCCESS
}

async fn propagate(path: &str, at: Option<DateTime<Utc>>, json: bool) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let source = match FeedSource::new(config.pipeline.fetch_timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let pipeline = Pipeline::new(
        source,
        BatchPropagator::new(Sgp4Model, config.pipeline.chunk_size),
        config.groups,
    );

    let Some(fetch) = pipeline.fetch(FetchScope::Enabled).await else {
        return ExitCode::FAILURE;
    };
    for id in &fetch.failed_groups {
        eprintln!("Failed to fetch group {}", id);
    }

    let at = at.unwrap_or_else(Utc::now);
    let Some(summary) = pipeline.run_pass_at(PassTrigger::Manual, at).await else {
        return ExitCode::FAILURE;
    };

    if json {
        match serde_json::to_string_pretty(pipeline.published().as_ref()) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                eprintln!("Error encoding positions: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!(
            "Propagated to {}: {} published, {} rejected, {} resolved from {} element sets ({} ms)",
            summary.timestamp,
            summary.published,
            summary.rejected,
            summary.resolved,
            fetch.element_sets,
            summary.duration_ms
        );
    }

    ExitCode::SUCCESS
}

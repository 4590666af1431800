// leettools-mcp-cli/src/main.rs
mod models;
mod rendering;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use leettools_mcp_core::config::ENV_LEET_HOME;
use leettools_mcp_core::{Dispatcher, LeetConfig, Response, serialize_response};

use crate::models::cli::Cli;
use crate::rendering::render_payload;

fn init_logging(verbose: u8) -> Result<Level> {
    let default_level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let time_format = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    );
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(LocalTime::new(time_format))
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(default_level)
}

/// Runs the selected tool and prints its payload. `Ok(false)` means the tool reported an error.
async fn run(cli: Cli) -> Result<bool> {
    let config = LeetConfig::from_env().context("Failed to load configuration")?;
    config.ensure_output_dir().context("Failed to prepare output directory")?;
    debug!(?config, "Loaded configuration");

    let tool_name = cli.command.tool_name();
    eprintln!("Running {}...", tool_name.bold());

    let dispatcher = Dispatcher::new(Arc::new(config));
    let raw = match cli.command.into_operation() {
        Ok(operation) => dispatcher.execute_json(&operation).await,
        Err(envelope) => serialize_response(tool_name, &Response::Error(envelope)),
    };
    eprintln!("Got response from {}", tool_name.bold());

    if cli.debug {
        eprintln!("{} {}", "Raw result:".dimmed(), raw);
    }

    match render_payload(&raw, cli.pretty) {
        Ok(rendered) => {
            println!("{}", rendered.text);
            if rendered.is_error {
                info!(tool = tool_name, "Tool returned an error payload");
            }
            Ok(!rendered.is_error)
        }
        Err(e) => {
            eprintln!("{} Failed to decode JSON result: {}", "Error:".red(), e);
            eprintln!("Raw output:");
            println!("{}", raw);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Early errors are printed before tracing owns the terminal.
    colored::control::set_override(true);

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = match init_logging(cli.verbose) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };
    colored::control::unset_override();
    info!("Logging initialized at {} (RUST_LOG overrides)", level);

    if std::env::var_os(ENV_LEET_HOME).is_none_or(|v| v.is_empty()) {
        eprintln!(
            "{} {} environment variable is not set. LeetTools might not work correctly.",
            "Warning:".yellow(),
            ENV_LEET_HOME
        );
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Operation failed: {:#}", e);
            eprintln!("{} Operation failed: {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

// leettools-mcp-server/src/main.rs
//! MCP server exposing LeetTools over stdio.
//!
//! ```bash
//! LEET_HOME=~/leettools leettools-mcp-server
//! ```
//!
//! stdout carries the protocol, so logs go to stderr and to
//! `<LEET_HOME>/mcp_outputs/leettools-mcp-server.log`.

mod handler;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use leettools_mcp_core::LeetConfig;

use crate::handler::LeetToolsServer;

const LOG_FILE_NAME: &str = "leettools-mcp-server.log";

fn init_logging(config: &LeetConfig) -> Result<WorkerGuard> {
    let default_level = if config.debug_logging { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let file_appender = tracing_appender::rolling::never(&config.output_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        level = %default_level,
        log_file = %config.output_dir.join(LOG_FILE_NAME).display(),
        "Logging initialized"
    );
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // The file layer needs the output directory, so config warnings go to a plain stderr logger.
    let bootstrap = fmt().with_writer(io::stderr).with_target(false).finish();
    let config = tracing::subscriber::with_default(bootstrap, || {
        let config = LeetConfig::from_env()?;
        config.ensure_output_dir()?;
        Ok::<_, leettools_mcp_core::LeetError>(config)
    })
    .context("Failed to load LeetTools configuration")?;

    let _guard = init_logging(&config)?;
    info!(
        leet_home = %config.leet_home.display(),
        output_dir = %config.output_dir.display(),
        context_length = ?config.context_length,
        "Starting LeetTools MCP server"
    );

    let server = LeetToolsServer::new(Arc::new(config));
    let ct = CancellationToken::new();

    let shutdown = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    let service = server
        .serve_with_ct(stdio(), ct)
        .await
        .context("Failed to start MCP service")?;
    let reason = service.waiting().await.context("MCP service task failed")?;

    info!(?reason, "LeetTools MCP server stopped");
    Ok(())
}

//! # Spout Executor
//!
//! Runs function handlers on behalf of a FaaS platform. A handler is loaded
//! from a directory and file name, invoked once with `(params, context)`, and
//! its JSON return value is reported back.
//!
//! ## Modes
//!
//! - **serve**: long-lived HTTP listener (port 8080 by default). Each POST body
//!   names a handler and its parameters, and the response is a JSON envelope
//!   `{ "Result": "<json>", "Success": true, "Duration": <secs> }`.
//! - **run**: one-shot invocation driven by `HANDLER`, `HANDLER_DIR`,
//!   `RESULT_FILE`, `PARAMS` and `CONTEXT`. The result is written to the
//!   result file and any failure exits the process with a non-zero status.
//!
//! ## Crate Organization
//!
//! - **api/**: HTTP-mode router and invoke endpoint
//! - **file_mode.rs**: one-shot result-file driver
//! - **config.rs**: HTTP-mode configuration
//! - **error.rs**: Request errors and their HTTP representation

use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use axum::Router;
use clap::{builder::FalseyValueParser, Args, Parser, Subcommand};
use spout_core::ModuleLoader;
use spout_executor::{
    api,
    config::{Config, DEFAULT_PORT},
    file_mode::{self, FileJob, FileModeError},
    ApiContext,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Executor for Spout function handlers
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Logging level (info, debug, trace)
    #[arg(long, global = true, env = "SPOUT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve invocation requests over HTTP
    Serve(ServeArgs),

    /// Invoke a single handler and write its result to a file
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "SPOUT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "SPOUT_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Context passed to every handler ("undefined" or absent means `{}`)
    #[arg(long, env = "CONTEXT")]
    context: Option<String>,

    /// Omit the Duration field from success responses
    #[arg(long, env = "SPOUT_NO_DURATION", value_parser = FalseyValueParser::new())]
    no_duration: bool,

    /// Keep loaded handlers in memory across requests
    #[arg(long, env = "SPOUT_CACHE_HANDLERS", value_parser = FalseyValueParser::new())]
    cache_handlers: bool,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Handler file name, resolved relative to the handler directory
    #[arg(long, env = "HANDLER")]
    handler: String,

    /// Directory containing the handler
    #[arg(long, env = "HANDLER_DIR")]
    handler_dir: PathBuf,

    /// File overwritten with the JSON encoding of the handler's return value
    #[arg(long, env = "RESULT_FILE")]
    result_file: PathBuf,

    /// Handler params as JSON ("undefined" or absent means `{}`)
    #[arg(long, env = "PARAMS")]
    params: Option<String>,

    /// Handler context as JSON ("undefined" or absent means `{}`)
    #[arg(long, env = "CONTEXT")]
    context: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = Level::from_str(cli.log_level.to_lowercase().as_str()).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Run(args) => run_once(args),
    }
}

fn run_once(args: RunArgs) {
    info!(handler = %args.handler, handler_dir = %args.handler_dir.display(), "Running handler once");

    if let Err(e) = run_job(args) {
        error!(error = %e, "Handler execution failed");
        std::process::exit(1);
    }
}

fn run_job(args: RunArgs) -> Result<(), FileModeError> {
    let job = FileJob::from_env_values(
        args.handler,
        args.handler_dir,
        args.result_file,
        args.params.as_deref(),
        args.context.as_deref(),
    );

    file_mode::run(&ModuleLoader::default(), job)
}

async fn serve(args: ServeArgs) {
    info!(version = %env!("CARGO_PKG_VERSION"), "Starting Spout executor");

    let config = match Config::try_new(
        &args.host,
        args.port,
        args.context.as_deref(),
        !args.no_duration,
        args.cache_handlers,
    ) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        addr = %config.addr,
        report_duration = config.report_duration,
        cache_handlers = config.cache_handlers,
        "Configuration validated successfully"
    );

    let addr = config.addr;
    let context = Arc::new(ApiContext::new(config));

    let shutdown_token = CancellationToken::new();
    let shutdown_token_ = shutdown_token.clone();

    tokio::spawn(async move {
        handle_shutdown_signals(shutdown_token_).await;
    });

    let app: Router = api::router().with_state(context);

    info!(addr = %addr, "Listening for connections");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    let server_handle = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_token))
        .await;

    match server_handle {
        Ok(_) => info!("Server shut down gracefully"),
        Err(e) => error!(error = %e, "Server error during shutdown"),
    }
}

/// Handler function for shutdown signals
async fn handle_shutdown_signals(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    shutdown_token.cancel();
}

/// Returns a future that resolves when the shutdown signal is received
async fn shutdown_signal_handler(token: CancellationToken) {
    token.cancelled().await;
    info!("Shutdown signal received, starting graceful shutdown");

    // Give in-flight requests some time to complete
    tokio::time::sleep(Duration::from_secs(1)).await;
}

//! TileProxy CLI - runs the tile proxy server
//!
//! Exit codes: 0 on normal shutdown, 2 on configuration errors, 1 otherwise.

mod args;
mod error;

use std::process::ExitCode;

use clap::Parser;
use tileproxy::app::TileProxyApp;
use tileproxy::logging::init_logging;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::args::Args;
use crate::error::CliError;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let _logging = init_logging(args.log_level.as_deref(), args.log_file.as_deref())?;

    let app = TileProxyApp::start(args.to_config())?;
    info!(
        version = tileproxy::VERSION,
        listen = %app.config().listen_addr,
        providers = ?app.coordinator().registry().ids(),
        "Starting tile proxy"
    );

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(app.serve(shutdown))?;
    Ok(())
}

//! Kaul binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use kaul_core::JsonFileStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kaul_server::cli::{Cli, Commands, LogFormat};
use kaul_server::KaulServer;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            let config = args.to_config();
            let addr = config.bind_addr;
            let server = KaulServer::new(config);
            server
                .serve_with_shutdown(addr, shutdown_signal())
                .await
                .context("vote API stopped with an error")?;
        }
        Commands::Reset(args) => {
            let store = JsonFileStore::new(&args.data_dir);
            kaul_core::store::reset(&store)
                .with_context(|| format!("failed to reset documents in {}", args.data_dir.display()))?;
            info!(
                subjects = %store.subjects_path().display(),
                users = %store.users_path().display(),
                "documents reset"
            );
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

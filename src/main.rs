use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio_util::sync::CancellationToken;

use go_import_redirector::config::Cli;
use go_import_redirector::{Server, shutdown_signal, tracing_setup};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Usage errors exit with status 2 before anything is bound.
    let config = Cli::parse().into_config().unwrap_or_else(|e| e.exit());

    tracing_setup::init_tracing(config.log_format)
        .map_err(|e| eyre!("failed to initialize logging: {e}"))?;

    let routes = config.routes()?;
    let server = Server::bind(&config.listen).await?.grace_period(config.grace);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutting down");
        on_signal.cancel();
    });

    server.serve(routes, shutdown).await?;
    Ok(())
}

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use plexstax::cli::Cli;
use plexstax::logging::init_tracing;
use plexstax::server::{self, AppState};
use plexstax::ServerError;
use plexstax_core::{Aggregator, SessionOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let settings = plexstax_config::load(cli.config.as_deref())?;
    let config = settings.stack_config()?;
    let addr = settings.bind_addr(cli.bind.as_deref())?;

    let shutdown = CancellationToken::new();
    let aggregator = Aggregator::from_config(&config, shutdown.clone())?;

    let configured = aggregator.configured();
    if configured.is_empty() {
        warn!("no services configured; every card will report not_configured");
    } else {
        info!(services = ?configured, "services configured");
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutting down");
                signal.cancel();
            }
            Err(err) => warn!(error = %err, "cannot listen for ctrl-c"),
        }
    });

    let state = AppState::new(aggregator, SessionOptions::from_config(&config), shutdown);
    server::serve(listener, state).await.map_err(ServerError::Serve)
}

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pseudogate::backend::MemoryBackend;
use pseudogate::linkage::{HttpTransport, LinkageConnection};
use pseudogate::{api, config, jobs, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "pseudogate=debug,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Check) => run_check(cfg).await,
        None => run_server(cfg, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(mut cfg: config::Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        cfg.port = port;
    }

    let state = Arc::new(AppState::new(cfg, Arc::new(MemoryBackend::new())));
    let app = api::router(state.clone());

    let sweeper = jobs::sweeper::spawn(
        state.store.clone(),
        state.config.token_ttl,
        state.config.sweep_interval,
    );
    tracing::info!(
        ttl_secs = state.config.token_ttl.as_secs(),
        interval_secs = state.config.sweep_interval.as_secs(),
        "token sweeper started"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("pseudogate listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}

/// Exercise the configured linkage service once: open a session, print what
/// came back, delete it again.
async fn run_check(cfg: config::Config) -> anyhow::Result<()> {
    let transport = HttpTransport::new();
    let connection = LinkageConnection::from_config(&cfg);

    let session = connection.open_session(&transport).await?;
    println!("Linkage service reachable:");
    println!("  URL:     {}", cfg.linkage_url);
    println!("  Session: {}", session.session_id());

    connection.close_session(&transport, &session).await?;
    println!("  Session closed.");
    Ok(())
}

use std::sync::Arc;

use clap::Parser;
use ledger_node::{router, Args, NodeConfig, NodeState};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = NodeConfig::from(Args::parse());
    let state = Arc::new(NodeState::new(&config)?);
    info!(
        "node {} mining at difficulty {}{}",
        state.node_id(),
        config.difficulty,
        if config.parallel_pow { " (parallel)" } else { "" }
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("ledger-node listening on http://{}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

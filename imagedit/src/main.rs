use anyhow::{Context, Result};
use imagedit::{State, config::Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    imagedit::init_logger();

    let config = Config::load(Config::path_from_env()).with_context(|| "load config failed")?;
    let addr = config.server.addr();

    let state = Arc::new(State::new(config)?);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr} failed"))?;

    log::info!("ImageEdit AI v{} listening on http://{addr}", env!("CARGO_PKG_VERSION"));

    axum::serve(listener, imagedit::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("ImageEdit AI stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("listen for ctrl-c failed: {e}");
    }
}

use anyhow::Context;

use stockledger_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockledger_observability::init();

    let config = LedgerConfig::from_env();
    tracing::info!(
        lock_timeout_ms = config.lock_timeout.map(|t| t.as_millis() as u64),
        policy = config.low_stock_policy.as_str(),
        default_threshold = config.default_low_stock_threshold,
        "configuration loaded"
    );

    let app = stockledger_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;

use spendtrack_api::app::{build_app, services};
use spendtrack_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spendtrack_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting");

    let services = services::build_services(&config).await?;
    services
        .identity
        .ensure_demo_user(&config.demo_user)
        .await
        .context("failed to bootstrap demo user")?;

    let app = build_app(Arc::new(services), &config.jwt_secret);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

use idsync_api::app::{IdentityServices, build_identity_app};
use idsync_infra::config::IdentityServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    idsync_observability::init("identity-service");

    let config = IdentityServiceConfig::from_env()?;
    let services = IdentityServices::from_config(&config)?;
    let app = build_identity_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "identity service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

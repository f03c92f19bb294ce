use idsync_api::app::{ProfileServices, build_profile_app};
use idsync_infra::config::ProfileServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    idsync_observability::init("profile-service");

    let config = ProfileServiceConfig::from_env()?;
    let services = ProfileServices::from_config(&config).await?;
    let app = build_profile_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "profile service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

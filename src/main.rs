use axum::{ServiceExt, extract::Request};
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::net::SocketAddr;

use classifieds_api::{
    config::AppConfig,
    db::run_migrations,
    routes::create_app,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,classifieds_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let state = AppState::connect(&config.database_url).await?;
    let applied = run_migrations(&state.orm).await?;
    tracing::info!(applied, "migrations applied");

    let app = create_app(state, &config);
    // Trailing slashes are trimmed before routing, so `/api/ads/` reaches `/api/ads`.
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        ServiceExt::<Request>::into_make_service(app),
    )
    .await?;

    Ok(())
}

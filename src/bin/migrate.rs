use classifieds_api::{config::AppConfig, db::{create_orm_conn, run_migrations}};

/// Applies `migrations/*.sql` without starting the server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    let applied = run_migrations(&orm).await?;
    tracing::info!(applied, "migrations applied");
    Ok(())
}

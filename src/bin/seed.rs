use classifieds_api::{
    config::AppConfig,
    db::run_migrations,
    services::auth_service::hash_password,
    state::AppState,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let state = AppState::connect(&config.database_url).await?;
    run_migrations(&state.orm).await?;
    let pool = state.pool;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", true).await?;
    let user_id = ensure_user(&pool, "user", "user@example.com", "user123", false).await?;
    seed_ads(&pool, user_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_staff)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET is_staff = EXCLUDED.is_staff
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_staff)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (staff={is_staff})");
    Ok(user_id)
}

async fn seed_ads(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let ads = vec![
        ("City bike", "Seven gears, new tyres", 1_500_000_i64, true),
        ("Oak desk", "Solid oak, 140x70 cm", 850_000, true),
        ("Film camera", "35mm, lens included", 1_200_000, true),
        ("Winter jacket", "Size M, worn twice", 450_000, false),
    ];

    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ads WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Ads already seeded");
        return Ok(());
    }

    for (title, description, price_cents, is_approved) in ads {
        sqlx::query(
            r#"
            INSERT INTO ads (id, owner_id, title, description, price_cents, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(price_cents)
        .bind(is_approved)
        .execute(pool)
        .await?;
    }

    println!("Seeded ads");
    Ok(())
}

#![allow(dead_code)]

use classifieds_api::{
    db::run_migrations,
    dto::ads::AdPayload,
    entity::users::ActiveModel as UserActive,
    middleware::auth::{AuthUser, Principal},
    models::Ad,
    services::ad_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Store-backed state, or `None` when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run store-backed tests."
            );
            return Ok(None);
        }
    };

    let state = AppState::connect(&database_url).await?;
    run_migrations(&state.orm).await?;
    Ok(Some(state))
}

/// Short random marker used to keep each test's rows apart.
pub fn unique_tag() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub async fn create_user(state: &AppState, is_staff: bool) -> anyhow::Result<AuthUser> {
    let username = format!("u_{}", unique_tag());
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(String::new()),
        password_hash: Set("unused".into()),
        is_staff: Set(is_staff),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
        is_staff: user.is_staff,
    })
}

pub async fn create_ad(
    state: &AppState,
    owner: &AuthUser,
    title: &str,
    price: &str,
) -> anyhow::Result<Ad> {
    let payload = AdPayload {
        title: Some(title.to_string()),
        description: Some(format!("Description of {title}")),
        price: Some(serde_json::json!(price)),
    };
    let resp = ad_service::create_ad(state, owner, payload).await?;
    resp.data.ok_or_else(|| anyhow::anyhow!("created ad missing"))
}

pub fn principal(user: &AuthUser) -> Principal {
    Principal::from_user(user.clone())
}

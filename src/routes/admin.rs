use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::ads::AdList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::{extract::ApiQuery, params::ModerationQuery},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/ads", get(list_moderation_queue))
}

#[utoipa::path(
    get,
    path = "/api/admin/ads",
    params(
        ("q" = Option<String>, Query, description = "Search title, description or owner username"),
        ("is_approved" = Option<bool>, Query, description = "Filter by approval state"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "All ads, newest first (staff only)", body = ApiResponse<AdList>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Moderation"
)]
pub async fn list_moderation_queue(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ModerationQuery>,
) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = admin_service::list_moderation_queue(&state, &user, query).await?;
    Ok(Json(resp))
}

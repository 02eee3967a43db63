use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::ads::{AdList, AdPayload},
    error::AppResult,
    middleware::auth::{AuthUser, Principal},
    models::{Ad, FavoriteStatus},
    response::ApiResponse,
    routes::{
        extract::{ApiJson, ApiPath, ApiQuery},
        params::AdQuery,
    },
    services::{
        ad_service::{self, WriteMode},
        favorite_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ads).post(create_ad))
        .route("/mine", get(list_my_ads))
        .route("/favorites", get(list_favorite_ads))
        .route(
            "/{id}",
            get(get_ad).put(replace_ad).patch(patch_ad).delete(delete_ad),
        )
        .route("/{id}/favorite", post(favorite).delete(unfavorite))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
}

#[utoipa::path(
    get,
    path = "/api/ads",
    params(
        ("q" = Option<String>, Query, description = "Case-insensitive search in title or description"),
        ("search" = Option<String>, Query, description = "Alias of q"),
        ("min_price" = Option<String>, Query, description = "Minimum price, inclusive"),
        ("max_price" = Option<String>, Query, description = "Maximum price, inclusive"),
        ("ordering" = Option<String>, Query, description = "price, -price, created_at, -created_at (default)"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List visible ads", body = ApiResponse<AdList>),
        (status = 400, description = "Invalid price filter")
    ),
    tag = "Ads"
)]
pub async fn list_ads(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<AdQuery>,
) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = ad_service::list_ads(&state, &principal, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ads",
    request_body = AdPayload,
    responses(
        (status = 201, description = "Ad created, pending approval", body = ApiResponse<Ad>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn create_ad(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AdPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<Ad>>)> {
    let resp = ad_service::create_ad(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/ads/mine",
    params(
        ("q" = Option<String>, Query, description = "Case-insensitive search in title or description"),
        ("min_price" = Option<String>, Query, description = "Minimum price, inclusive"),
        ("max_price" = Option<String>, Query, description = "Maximum price, inclusive"),
        ("ordering" = Option<String>, Query, description = "price, -price, created_at, -created_at (default)"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Ads owned by the requester", body = ApiResponse<AdList>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn list_my_ads(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<AdQuery>,
) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = ad_service::list_my_ads(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ads/favorites",
    params(
        ("q" = Option<String>, Query, description = "Case-insensitive search in title or description"),
        ("min_price" = Option<String>, Query, description = "Minimum price, inclusive"),
        ("max_price" = Option<String>, Query, description = "Maximum price, inclusive"),
        ("ordering" = Option<String>, Query, description = "price, -price, created_at, -created_at (default)"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Ads favorited by the requester", body = ApiResponse<AdList>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorite_ads(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<AdQuery>,
) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = ad_service::list_favorite_ads(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Get ad", body = ApiResponse<Ad>),
        (status = 404, description = "Ad not found or not visible"),
    ),
    tag = "Ads"
)]
pub async fn get_ad(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::get_ad(&state, &principal, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    request_body = AdPayload,
    responses(
        (status = 200, description = "Replaced ad content", body = ApiResponse<Ad>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Ad not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn replace_ad(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdPayload>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::update_ad(&state, &user, id, payload, WriteMode::Replace).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    request_body = AdPayload,
    responses(
        (status = 200, description = "Updated ad content", body = ApiResponse<Ad>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Ad not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn patch_ad(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdPayload>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::update_ad(&state, &user, id, payload, WriteMode::Partial).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Deleted ad", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Ad not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Ads"
)]
pub async fn delete_ad(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = ad_service::delete_ad(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ads/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Ad is favorited", body = ApiResponse<FavoriteStatus>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Ad not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::favorite_ad(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/ads/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Ad is not favorited", body = ApiResponse<FavoriteStatus>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Ad not found or not visible")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn unfavorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::unfavorite_ad(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ads/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Ad approved", body = ApiResponse<Ad>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Ad not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Moderation"
)]
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::set_approval(&state, &user, id, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ads/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Ad rejected", body = ApiResponse<Ad>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Ad not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Moderation"
)]
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::set_approval(&state, &user, id, false).await?;
    Ok(Json(resp))
}

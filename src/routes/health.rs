use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::Message,
    response::{ApiResponse, Meta},
};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Diagnostics"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/hello",
    responses(
        (status = 200, description = "Greeting with server time", body = ApiResponse<Message>),
    ),
    tag = "Diagnostics"
)]
pub async fn hello() -> Json<ApiResponse<Message>> {
    let data = Message {
        message: "Hello!".to_string(),
        timestamp: Utc::now(),
    };

    Json(ApiResponse::success("Hello", data, Some(Meta::empty())))
}

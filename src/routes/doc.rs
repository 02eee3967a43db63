use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        ads::{AdList, AdPayload},
        auth::{LoginRequest, MeResponse, RegisterRequest, TokenResponse},
    },
    error::ValidationErrors,
    models::{Ad, FavoriteStatus, Message, UserPublic},
    response::{ApiResponse, Meta},
    routes::{admin, ads, auth, health, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // Opaque token sent as `Authorization: Token <key>` (or `Bearer <key>`).
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <key>",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::hello,
        auth::register,
        auth::login,
        auth::me,
        ads::list_ads,
        ads::create_ad,
        ads::list_my_ads,
        ads::list_favorite_ads,
        ads::get_ad,
        ads::replace_ad,
        ads::patch_ad,
        ads::delete_ad,
        ads::favorite,
        ads::unfavorite,
        ads::approve,
        ads::reject,
        admin::list_moderation_queue
    ),
    components(
        schemas(
            Ad,
            AdList,
            AdPayload,
            FavoriteStatus,
            UserPublic,
            Message,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            MeResponse,
            ValidationErrors,
            health::HealthData,
            params::Pagination,
            params::AdQuery,
            params::ModerationQuery,
            Meta,
            ApiResponse<Ad>,
            ApiResponse<AdList>,
            ApiResponse<FavoriteStatus>,
            ApiResponse<TokenResponse>,
            ApiResponse<MeResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Diagnostics", description = "Health and greeting endpoints"),
        (name = "Auth", description = "Registration and token endpoints"),
        (name = "Ads", description = "Classified ad endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Moderation", description = "Staff-only approval endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

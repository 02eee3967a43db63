use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    entity::favorites::{ActiveModel, Column, Entity as Favorites},
    error::AppResult,
    middleware::auth::{AuthUser, Principal},
    models::FavoriteStatus,
    response::{ApiResponse, Meta},
    services::ad_service::find_visible,
    state::AppState,
};

/// Idempotent: repeating the call leaves a single row.
pub async fn favorite_ad(
    state: &AppState,
    user: &AuthUser,
    ad_id: Uuid,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    let principal = Principal::from_user(user.clone());
    let (ad, _) = find_visible(state, &principal, ad_id).await?;

    let favorite = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        ad_id: Set(ad.id),
        created_at: NotSet,
    };
    // A concurrent favorite of the same pair hits the unique constraint and is skipped.
    let inserted = Favorites::insert(favorite)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::AdId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    if inserted > 0 {
        audit::record(
            state,
            user.user_id,
            AuditAction::FavoriteAdd,
            serde_json::json!({ "ad_id": ad.id }),
        )
        .await;
    }

    let favorites_count = count_for_ad(&state.orm, ad.id).await?;
    Ok(ApiResponse::success(
        "Added to favorites",
        FavoriteStatus {
            is_favorited: true,
            favorites_count,
        },
        Some(Meta::empty()),
    ))
}

/// Removing a favorite that does not exist is a no-op.
pub async fn unfavorite_ad(
    state: &AppState,
    user: &AuthUser,
    ad_id: Uuid,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    let principal = Principal::from_user(user.clone());
    let (ad, _) = find_visible(state, &principal, ad_id).await?;

    let result = Favorites::delete_many()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::AdId.eq(ad.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            state,
            user.user_id,
            AuditAction::FavoriteRemove,
            serde_json::json!({ "ad_id": ad.id }),
        )
        .await;
    }

    let favorites_count = count_for_ad(&state.orm, ad.id).await?;
    Ok(ApiResponse::success(
        "Removed from favorites",
        FavoriteStatus {
            is_favorited: false,
            favorites_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn count_for_ad<C: ConnectionTrait>(db: &C, ad_id: Uuid) -> AppResult<i64> {
    let count = Favorites::find()
        .filter(Column::AdId.eq(ad_id))
        .count(db)
        .await?;
    Ok(count as i64)
}

/// Number of favorite rows for one user and ad; 0 or 1 by the unique constraint.
pub async fn count_for_pair<C: ConnectionTrait>(db: &C, user_id: Uuid, ad_id: Uuid) -> AppResult<i64> {
    let count = Favorites::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::AdId.eq(ad_id))
        .count(db)
        .await?;
    Ok(count as i64)
}

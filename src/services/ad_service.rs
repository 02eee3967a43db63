use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::ads::{AdList, AdPayload},
    entity::{
        ads::{ActiveModel, Column, Entity as Ads, Model as AdModel},
        favorites::{self, Entity as Favorites},
        users::Entity as Users,
    },
    error::{AppError, AppResult, ValidationErrors},
    middleware::auth::{AuthUser, Principal, ensure_staff},
    models::{Ad, Price, UserPublic},
    permissions::{can_view, ensure_can_modify, visibility_condition},
    response::{ApiResponse, Meta},
    routes::params::{AdFilters, AdOrdering, AdQuery, Pagination},
    services::auth_service::user_public_from_entity,
    state::AppState,
};

const MAX_TITLE_LENGTH: usize = 255;

/// `PUT` replaces every content field, `PATCH` only those present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    Partial,
}

/// Validated content fields. `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

pub fn validate_ad_payload(
    payload: &AdPayload,
    mode: WriteMode,
) -> Result<AdChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let required = mode == WriteMode::Replace;

    let title = validate_text(
        "title",
        payload.title.as_deref(),
        required,
        Some(MAX_TITLE_LENGTH),
        &mut errors,
    );
    let description =
        validate_text("description", payload.description.as_deref(), required, None, &mut errors);

    let price = match &payload.price {
        None if required => {
            errors.add("price", "This field is required.");
            None
        }
        None => None,
        Some(Value::Null) => {
            errors.add("price", "This field may not be null.");
            None
        }
        Some(value) => match Price::from_json(value) {
            Ok(price) => Some(price),
            Err(err) => {
                errors.add("price", err.to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AdChanges {
        title,
        description,
        price,
    })
}

fn validate_text(
    field: &str,
    value: Option<&str>,
    required: bool,
    max_len: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, "This field is required.");
        }
        return None;
    };

    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if let Some(max_len) = max_len {
        if value.chars().count() > max_len {
            errors.add(
                field,
                format!("Ensure this field has no more than {max_len} characters."),
            );
            return None;
        }
    }
    Some(value.to_string())
}

/// Escapes `%`, `_` and `\` so the term matches literally inside `ILIKE`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Visibility first, then the optional text and price criteria, all ANDed.
pub fn listing_condition(principal: &Principal, filters: &AdFilters) -> Condition {
    let mut condition = Condition::all();

    if let Some(visibility) = visibility_condition(principal) {
        condition = condition.add(visibility);
    }

    if let Some(search) = filters.search.as_deref() {
        let pattern = like_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Ads, Column::Title)).ilike(pattern.clone()))
                .add(Expr::col((Ads, Column::Description)).ilike(pattern)),
        );
    }

    if let Some(min_price) = filters.min_price {
        condition = condition.add(Column::PriceCents.gte(min_price.cents()));
    }

    if let Some(max_price) = filters.max_price {
        condition = condition.add(Column::PriceCents.lte(max_price.cents()));
    }

    condition
}

/// Ties on price fall back to newest first, and `id` makes every order total.
pub fn apply_ordering(select: Select<Ads>, ordering: AdOrdering) -> Select<Ads> {
    match ordering {
        AdOrdering::PriceAsc => select
            .order_by_asc(Column::PriceCents)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id),
        AdOrdering::PriceDesc => select
            .order_by_desc(Column::PriceCents)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id),
        AdOrdering::CreatedAtAsc => select
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id),
        AdOrdering::CreatedAtDesc => select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id),
    }
}

pub async fn list_ads(
    state: &AppState,
    principal: &Principal,
    query: AdQuery,
) -> AppResult<ApiResponse<AdList>> {
    let filters = query.filters().map_err(AppError::Validation)?;
    let select = Ads::find().filter(listing_condition(principal, &filters));
    paginate_ads(state, principal, select, filters.ordering, query.pagination(), "Ads").await
}

/// The requester's own ads, approved or not.
pub async fn list_my_ads(
    state: &AppState,
    user: &AuthUser,
    query: AdQuery,
) -> AppResult<ApiResponse<AdList>> {
    let principal = Principal::from_user(user.clone());
    let filters = query.filters().map_err(AppError::Validation)?;
    let condition = listing_condition(&principal, &filters).add(Column::OwnerId.eq(user.user_id));
    let select = Ads::find().filter(condition);
    paginate_ads(state, &principal, select, filters.ordering, query.pagination(), "My ads").await
}

/// Ads the requester favorited that are still visible to them.
pub async fn list_favorite_ads(
    state: &AppState,
    user: &AuthUser,
    query: AdQuery,
) -> AppResult<ApiResponse<AdList>> {
    let principal = Principal::from_user(user.clone());
    let filters = query.filters().map_err(AppError::Validation)?;
    let favorited_ids = Query::select()
        .column(favorites::Column::AdId)
        .from(Favorites)
        .and_where(favorites::Column::UserId.eq(user.user_id))
        .to_owned();
    let condition =
        listing_condition(&principal, &filters).add(Column::Id.in_subquery(favorited_ids));
    let select = Ads::find().filter(condition);
    paginate_ads(
        state,
        &principal,
        select,
        filters.ordering,
        query.pagination(),
        "Favorite ads",
    )
    .await
}

pub(crate) async fn paginate_ads(
    state: &AppState,
    principal: &Principal,
    select: Select<Ads>,
    ordering: AdOrdering,
    pagination: Pagination,
    message: &str,
) -> AppResult<ApiResponse<AdList>> {
    let (page, limit, offset) = pagination.normalize();

    let total = select.clone().count(&state.orm).await? as i64;

    let rows = apply_ordering(select, ordering)
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut owned = Vec::with_capacity(rows.len());
    for (ad, owner) in rows {
        let owner = owner
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("ad {} has no owner", ad.id)))?;
        owned.push((ad, user_public_from_entity(&owner)));
    }
    let items = project_ads(&state.orm, principal, owned).await?;

    Ok(ApiResponse::paged(message, AdList { items }, page, limit, total))
}

/// Attach the requester-relative fields to a batch of ads.
async fn project_ads<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
    rows: Vec<(AdModel, UserPublic)>,
) -> AppResult<Vec<Ad>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|(ad, _)| ad.id).collect();
    let counts = favorite_counts(db, &ids).await?;
    let favorited = match principal.user_id() {
        Some(user_id) => favorited_by(db, user_id, &ids).await?,
        None => HashSet::new(),
    };

    Ok(rows
        .into_iter()
        .map(|(ad, owner)| {
            let count = counts.get(&ad.id).copied().unwrap_or(0);
            let is_favorited = favorited.contains(&ad.id);
            ad_from_entity(ad, owner, principal, is_favorited, count)
        })
        .collect())
}

pub(crate) async fn project_ad<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
    ad: AdModel,
    owner: UserPublic,
) -> AppResult<Ad> {
    let mut items = project_ads(db, principal, vec![(ad, owner)]).await?;
    items
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("projection dropped an ad")))
}

async fn favorite_counts<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
    let rows: Vec<(Uuid, i64)> = Favorites::find()
        .select_only()
        .column(favorites::Column::AdId)
        .column_as(favorites::Column::Id.count(), "favorites_count")
        .filter(favorites::Column::AdId.is_in(ids.iter().copied()))
        .group_by(favorites::Column::AdId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

async fn favorited_by<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    let rows: Vec<Uuid> = Favorites::find()
        .select_only()
        .column(favorites::Column::AdId)
        .filter(favorites::Column::UserId.eq(user_id))
        .filter(favorites::Column::AdId.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub fn ad_from_entity(
    model: AdModel,
    owner: UserPublic,
    principal: &Principal,
    is_favorited: bool,
    favorites_count: i64,
) -> Ad {
    let is_owner = principal.user_id() == Some(model.owner_id);
    Ad {
        id: model.id,
        owner,
        title: model.title,
        description: model.description,
        price: Price::from_cents(model.price_cents),
        is_approved: model.is_approved,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        is_owner,
        is_favorited: principal.is_authenticated() && is_favorited,
        favorites_count,
    }
}

/// Loads an ad the principal may see. Hidden ads are reported as missing.
pub(crate) async fn find_visible(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<(AdModel, UserPublic)> {
    let found = Ads::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?;

    match found {
        Some((ad, Some(owner))) if can_view(principal, &ad) => {
            Ok((ad, user_public_from_entity(&owner)))
        }
        _ => Err(AppError::NotFound),
    }
}

pub async fn get_ad(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<Ad>> {
    let (ad, owner) = find_visible(state, principal, id).await?;
    let ad = project_ad(&state.orm, principal, ad, owner).await?;
    Ok(ApiResponse::success("Ad", ad, None))
}

/// New ads always start unapproved and belong to the requester.
pub async fn create_ad(
    state: &AppState,
    user: &AuthUser,
    payload: AdPayload,
) -> AppResult<ApiResponse<Ad>> {
    let changes = validate_ad_payload(&payload, WriteMode::Replace).map_err(AppError::Validation)?;
    let (Some(title), Some(description), Some(price)) =
        (changes.title, changes.description, changes.price)
    else {
        return Err(AppError::Internal(anyhow::anyhow!(
            "validated ad payload is incomplete"
        )));
    };

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        title: Set(title),
        description: Set(description),
        price_cents: Set(price.cents()),
        is_approved: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let ad = active.insert(&state.orm).await?;
    tracing::debug!(ad_id = %ad.id, owner_id = %user.user_id, "ad created");

    audit::record(
        state,
        user.user_id,
        AuditAction::AdCreate,
        serde_json::json!({ "ad_id": ad.id }),
    )
    .await;

    let principal = Principal::from_user(user.clone());
    let owner = UserPublic {
        id: user.user_id,
        username: user.username.clone(),
    };
    let ad = project_ad(&state.orm, &principal, ad, owner).await?;
    Ok(ApiResponse::success("Ad created", ad, Some(Meta::empty())))
}

pub async fn update_ad(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdPayload,
    mode: WriteMode,
) -> AppResult<ApiResponse<Ad>> {
    let principal = Principal::from_user(user.clone());
    let (existing, owner) = find_visible(state, &principal, id).await?;
    ensure_can_modify(user, &existing)?;
    let changes = validate_ad_payload(&payload, mode).map_err(AppError::Validation)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(price) = changes.price {
        active.price_cents = Set(price.cents());
    }
    active.updated_at = Set(Utc::now().into());

    let ad = active.update(&state.orm).await?;

    audit::record(
        state,
        user.user_id,
        AuditAction::AdUpdate,
        serde_json::json!({ "ad_id": ad.id }),
    )
    .await;

    let ad = project_ad(&state.orm, &principal, ad, owner).await?;
    Ok(ApiResponse::success("Updated", ad, Some(Meta::empty())))
}

pub async fn delete_ad(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let principal = Principal::from_user(user.clone());
    let (existing, _) = find_visible(state, &principal, id).await?;
    ensure_can_modify(user, &existing)?;

    let result = Ads::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        user.user_id,
        AuditAction::AdDelete,
        serde_json::json!({ "ad_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Staff-only flip of the approval flag. No other column is written.
pub async fn set_approval(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    approved: bool,
) -> AppResult<ApiResponse<Ad>> {
    ensure_staff(user)?;
    let principal = Principal::from_user(user.clone());
    let (existing, owner) = find_visible(state, &principal, id).await?;

    let mut active: ActiveModel = existing.into();
    active.is_approved = Set(approved);
    let ad = active.update(&state.orm).await?;

    let action = if approved {
        AuditAction::AdApprove
    } else {
        AuditAction::AdReject
    };
    tracing::info!(ad_id = %ad.id, staff_id = %user.user_id, approved, "ad moderated");
    audit::record(state, user.user_id, action, serde_json::json!({ "ad_id": ad.id })).await;

    let message = if approved { "Ad approved" } else { "Ad rejected" };
    let ad = project_ad(&state.orm, &principal, ad, owner).await?;
    Ok(ApiResponse::success(message, ad, Some(Meta::empty())))
}

use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};

use crate::{
    dto::ads::AdList,
    entity::{
        ads::{Column, Entity as Ads},
        users::{self, Entity as Users},
    },
    error::AppResult,
    middleware::auth::{AuthUser, Principal, ensure_staff},
    response::ApiResponse,
    routes::params::{AdOrdering, ModerationQuery},
    services::ad_service::{like_pattern, paginate_ads},
    state::AppState,
};

/// Search over title, description and the owner's username.
pub fn moderation_condition(query: &ModerationQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(is_approved) = query.is_approved {
        condition = condition.add(Column::IsApproved.eq(is_approved));
    }

    if let Some(search) = query.search() {
        let pattern = like_pattern(search);
        let owners = Query::select()
            .column(users::Column::Id)
            .from(Users)
            .and_where(Expr::col((Users, users::Column::Username)).ilike(pattern.clone()))
            .to_owned();
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Ads, Column::Title)).ilike(pattern.clone()))
                .add(Expr::col((Ads, Column::Description)).ilike(pattern))
                .add(Column::OwnerId.in_subquery(owners)),
        );
    }

    condition
}

pub async fn list_moderation_queue(
    state: &AppState,
    user: &AuthUser,
    query: ModerationQuery,
) -> AppResult<ApiResponse<AdList>> {
    ensure_staff(user)?;
    let principal = Principal::from_user(user.clone());
    let select = Ads::find().filter(moderation_condition(&query));
    paginate_ads(
        state,
        &principal,
        select,
        AdOrdering::CreatedAtDesc,
        query.pagination(),
        "Moderation queue",
    )
    .await
}

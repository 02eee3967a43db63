//! Who may see and who may change an ad.

use sea_orm::{ColumnTrait, Condition};

use crate::{
    entity::ads::{Column, Model as AdModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Principal},
};

/// Approved ads are public; staff see everything; owners see their own.
pub fn can_view(principal: &Principal, ad: &AdModel) -> bool {
    ad.is_approved || principal.is_staff() || principal.user_id() == Some(ad.owner_id)
}

pub fn can_modify(user: &AuthUser, ad: &AdModel) -> bool {
    user.is_staff || user.user_id == ad.owner_id
}

pub fn ensure_can_modify(user: &AuthUser, ad: &AdModel) -> AppResult<()> {
    if can_modify(user, ad) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Row filter equivalent to [`can_view`]. `None` when nothing is hidden.
pub fn visibility_condition(principal: &Principal) -> Option<Condition> {
    match principal {
        Principal::Staff(_) => None,
        Principal::User(user) => Some(
            Condition::any()
                .add(Column::IsApproved.eq(true))
                .add(Column::OwnerId.eq(user.user_id)),
        ),
        Principal::Anonymous => Some(Condition::all().add(Column::IsApproved.eq(true))),
    }
}

use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    AdCreate,
    AdUpdate,
    AdDelete,
    AdApprove,
    AdReject,
    FavoriteAdd,
    FavoriteRemove,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::AdCreate => "ad_create",
            AuditAction::AdUpdate => "ad_update",
            AuditAction::AdDelete => "ad_delete",
            AuditAction::AdApprove => "ad_approve",
            AuditAction::AdReject => "ad_reject",
            AuditAction::FavoriteAdd => "favorite_add",
            AuditAction::FavoriteRemove => "favorite_remove",
        }
    }

    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister | AuditAction::UserLogin => "users",
            AuditAction::FavoriteAdd | AuditAction::FavoriteRemove => "favorites",
            _ => "ads",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Appends an audit row; failures are logged and swallowed.
pub async fn record(state: &AppState, user_id: Uuid, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        action.as_str(),
        Some(action.resource()),
        Some(metadata),
    )
    .await
    {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}

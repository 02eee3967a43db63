use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, services::auth_service, state::AppState};

/// Authorization schemes carrying an opaque token key.
const TOKEN_SCHEMES: [&str; 2] = ["token", "bearer"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub is_staff: bool,
}

/// Who is making the request. Resolved once per request and handed to
/// every service call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    User(AuthUser),
    Staff(AuthUser),
}

impl Principal {
    pub fn from_user(user: AuthUser) -> Self {
        if user.is_staff {
            Principal::Staff(user)
        } else {
            Principal::User(user)
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Anonymous => None,
            Principal::User(user) | Principal::Staff(user) => Some(user),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|user| user.user_id)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Principal::Staff(_))
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Principal::Anonymous)
    }

    pub fn require_user(&self) -> Result<&AuthUser, AppError> {
        self.user().ok_or_else(AppError::authentication_required)
    }
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_staff {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Extracts the token key from `Authorization: Token <key>` or `Bearer <key>`.
/// A missing header or a foreign scheme yields `None` (anonymous request).
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid token header.".into()))?;

    let mut parts = value.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !TOKEN_SCHEMES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(scheme))
    {
        return Ok(None);
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key.to_string())),
        (None, _) => Err(AppError::Unauthorized(
            "Invalid token header. No credentials provided.".into(),
        )),
        (Some(_), Some(_)) => Err(AppError::Unauthorized(
            "Invalid token header. Token string should not contain spaces.".into(),
        )),
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = token_from_headers(&parts.headers)? else {
            return Ok(Principal::Anonymous);
        };

        match auth_service::resolve_token(state, &key).await? {
            Some(user) => Ok(Principal::from_user(user)),
            None => Err(AppError::Unauthorized("Invalid token.".into())),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        principal.require_user().cloned()
    }
}

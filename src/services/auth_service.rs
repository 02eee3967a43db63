use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::auth::{LoginRequest, MeResponse, RegisterRequest, TokenResponse},
    entity::{
        auth_tokens::{self, Entity as AuthTokens},
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult, ValidationErrors},
    middleware::auth::AuthUser,
    models::UserPublic,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_USERNAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;
const TOKEN_BYTES: usize = 20;
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

/// Registration input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(payload: &RegisterRequest) -> Result<NewUser, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    if payload.username.is_none() {
        errors.add("username", "This field is required.");
    } else if username.is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            "Ensure this field has no more than 150 characters.",
        );
    } else if !username.chars().all(is_username_char) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    if !email.is_empty() && (email.len() > MAX_EMAIL_LENGTH || !looks_like_email(email)) {
        errors.add("email", "Enter a valid email address.");
    }

    let password = payload.password.as_deref().unwrap_or_default();
    if payload.password.is_none() {
        errors.add("password", "This field is required.");
    } else if password.trim().is_empty() {
        errors.add("password", "This field may not be blank.");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Both credentials must be present and non-blank before any lookup.
pub fn validate_login(payload: &LoginRequest) -> Result<(&str, &str), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let username = required_field("username", payload.username.as_deref(), &mut errors);
    let password = required_field("password", payload.password.as_deref(), &mut errors);

    match (username, password) {
        (Some(username), Some(password)) if errors.is_empty() => Ok((username.trim(), password)),
        _ => Err(errors),
    }
}

fn required_field<'a>(
    field: &str,
    value: Option<&'a str>,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match value {
        None => {
            errors.add(field, "This field is required.");
            None
        }
        Some(value) if value.trim().is_empty() => {
            errors.add(field, "This field may not be blank.");
            None
        }
        Some(value) => Some(value),
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '+' | '-')
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 40 lowercase hex characters from the OS RNG.
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Returns the user's token, creating it on first use. Concurrent callers
/// converge on the single row allowed by the unique `user_id` constraint.
pub async fn issue_token<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<String> {
    if let Some(existing) = find_token_for_user(db, user_id).await? {
        return Ok(existing.key);
    }

    let token = auth_tokens::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user_id),
        created_at: NotSet,
    };
    AuthTokens::insert(token)
        .on_conflict(
            OnConflict::column(auth_tokens::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let token = find_token_for_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("token missing after insert")))?;
    Ok(token.key)
}

async fn find_token_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Option<auth_tokens::Model>> {
    let token = AuthTokens::find()
        .filter(auth_tokens::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(token)
}

/// Maps a presented token key to its user.
pub async fn resolve_token(state: &AppState, key: &str) -> AppResult<Option<AuthUser>> {
    let found = AuthTokens::find_by_id(key.to_string())
        .find_also_related(Users)
        .one(&state.orm)
        .await?;

    Ok(match found {
        Some((_, Some(user))) => Some(auth_user_from_entity(user)),
        _ => None,
    })
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let new_user = validate_registration(&payload).map_err(AppError::Validation)?;

    let taken = Users::find()
        .filter(users::Column::Username.eq(new_user.username.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation(ValidationErrors::single(
            "username",
            DUPLICATE_USERNAME,
        )));
    }

    let password_hash = hash_password(&new_user.password)?;

    let txn = state.orm.begin().await?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(new_user.username),
        email: Set(new_user.email),
        password_hash: Set(password_hash),
        is_staff: Set(false),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation(ValidationErrors::single("username", DUPLICATE_USERNAME))
        }
        _ => AppError::OrmError(err),
    })?;
    let token = issue_token(&txn, user.id).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    audit::record(
        state,
        user.id,
        AuditAction::UserRegister,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        TokenResponse {
            token,
            user: user_public_from_entity(&user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let (username, password) = validate_login(&payload).map_err(AppError::Validation)?;
    let user = Users::find()
        .filter(users::Column::Username.eq(username))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let token = issue_token(&state.orm, user.id).await?;

    audit::record(
        state,
        user.id,
        AuditAction::UserLogin,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse {
            token,
            user: user_public_from_entity(&user),
        },
        Some(Meta::empty()),
    ))
}

pub fn me(user: &AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::success(
        "Current user",
        MeResponse {
            user: UserPublic {
                id: user.user_id,
                username: user.username.clone(),
            },
        },
        Some(Meta::empty()),
    )
}

pub fn user_public_from_entity(model: &users::Model) -> UserPublic {
    UserPublic {
        id: model.id,
        username: model.username.clone(),
    }
}

fn auth_user_from_entity(model: users::Model) -> AuthUser {
    AuthUser {
        user_id: model.id,
        username: model.username,
        is_staff: model.is_staff,
    }
}

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::User,
    repository::UserRepository,
    utils::verify_password,
    AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid username/password.";
const INACTIVE_USER: &str = "User inactive or deleted.";
const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
const ROLE_CREATE_FORBIDDEN: &str = "You do not have permission to create roles.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_superuser: user.is_superuser,
        }
    }
}

/// Who is making the request. Resolved from HTTP Basic credentials; a
/// request without an `Authorization: Basic` header is anonymous, while bad
/// credentials reject the request outright with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(CurrentUser),
}

impl Caller {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Caller::User(user) => Some(user),
            Caller::Anonymous => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Caller::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthenticated("Invalid basic header.".to_string()))?;

        let Some((username, password)) = parse_basic_credentials(value)? else {
            return Ok(Caller::Anonymous);
        };

        authenticate(state, &username, &password).await.map(Caller::User)
    }
}

/// Splits an `Authorization` header value into username and password.
/// Returns `Ok(None)` for non-Basic schemes so other schemes stay anonymous.
pub fn parse_basic_credentials(value: &str) -> AppResult<Option<(String, String)>> {
    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("basic") => {}
        _ => return Ok(None),
    }

    let encoded = parts.next().ok_or_else(|| {
        AppError::Unauthenticated("Invalid basic header. No credentials provided.".to_string())
    })?;
    if parts.next().is_some() {
        return Err(AppError::Unauthenticated(
            "Invalid basic header. Credentials string should not contain spaces.".to_string(),
        ));
    }

    let invalid_encoding = || {
        AppError::Unauthenticated(
            "Invalid basic header. Credentials not correctly base64 encoded.".to_string(),
        )
    };
    let decoded = STANDARD.decode(encoded).map_err(|_| invalid_encoding())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid_encoding())?;
    let (username, password) = decoded.split_once(':').ok_or_else(invalid_encoding)?;

    Ok(Some((username.to_string(), password.to_string())))
}

async fn authenticate(state: &AppState, username: &str, password: &str) -> AppResult<CurrentUser> {
    let Some(user) = state.repo.get_user_by_username(username).await? else {
        // Burn the same bcrypt work as a real mismatch.
        verify_password(password, state.dummy_hash().await?).await?;
        debug!("Authentication failed for unknown user {}", username);
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, &user.password_hash).await? {
        warn!("Authentication failed for user {}: bad password", username);
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }
    if !user.is_active {
        return Err(AppError::Unauthenticated(INACTIVE_USER.to_string()));
    }

    Ok(CurrentUser::from(user))
}

/// Guard: any authenticated caller.
pub fn require_authenticated(caller: &Caller) -> AppResult<&CurrentUser> {
    caller
        .user()
        .ok_or_else(|| AppError::Unauthenticated(NOT_AUTHENTICATED.to_string()))
}

/// Guard: authenticated superuser. Anonymous callers get 401, everyone else 403.
pub fn require_superuser(caller: &Caller) -> AppResult<&CurrentUser> {
    let user = require_authenticated(caller)?;
    if !user.is_superuser {
        warn!("User {} attempted to create a role without superuser status", user.username);
        return Err(AppError::Forbidden(ROLE_CREATE_FORBIDDEN.to_string()));
    }
    Ok(user)
}

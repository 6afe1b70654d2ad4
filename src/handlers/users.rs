use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use log::{debug, error, info};

use crate::{
    error::{already_exists, AppResult},
    middleware::Caller,
    models::{CreateUserRequest, UserResponse},
    repository::UserRepository,
    utils::hash_password,
    AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    _caller: Caller,
) -> AppResult<Json<Vec<UserResponse>>> {
    debug!("Fetching all users.");
    let users: Vec<UserResponse> = state
        .repo
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    info!("User data retrieved: {} users", users.len());
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    _caller: Caller,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(payload) = payload?;
    debug!("Creating user with details: {:?}", payload);

    // Uniqueness is only checked for fields that passed their own rules, and
    // lands in the same error map as the field errors.
    let mut draft = payload.clean();
    if let Some(username) = &draft.username {
        if state.repo.username_exists(username).await? {
            draft.errors.add("username", already_exists("user", "username"));
        }
    }
    if let Some(email) = &draft.email {
        if state.repo.email_exists(email).await? {
            draft.errors.add("email", already_exists("user", "email"));
        }
    }

    let validated = draft.finish().map_err(|errors| {
        error!("User creation error: {}", errors);
        errors
    })?;

    let password_hash = hash_password(&validated.password, state.bcrypt_cost).await?;
    let user = state
        .repo
        .create_user(validated.into_new_user(password_hash))
        .await?;

    debug!("User {} created successfully.", user.username);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

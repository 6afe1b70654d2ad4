use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use log::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    middleware::Caller,
    models::{AssignRoleRequest, MessageResponse},
    repository::{AssignmentRepository, RepositoryError, RoleRepository, UserRepository},
    AppState,
};

const NOT_FOUND: &str = "User or Role not found";

pub async fn assign_role(
    State(state): State<AppState>,
    _caller: Caller,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;

    let user = match payload.user_id() {
        Some(id) => state.repo.get_user(id).await?,
        None => None,
    };
    let role = match payload.role_id() {
        Some(id) => state.repo.get_role(id).await?,
        None => None,
    };
    let (Some(user), Some(role)) = (user, role) else {
        warn!(
            "Role assignment rejected: user_id={} role_id={}",
            payload.user_id, payload.role_id
        );
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };

    // Either row may disappear between lookup and insert.
    state
        .repo
        .assign_role(user.id, role.id)
        .await
        .map_err(|err| match err {
            RepositoryError::ForeignKeyViolation(_) => AppError::NotFound(NOT_FOUND.to_string()),
            other => other.into(),
        })?;

    debug!("Role {} assigned to {}.", role.name, user.username);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Role assigned successfully")),
    ))
}

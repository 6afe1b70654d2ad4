use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use log::debug;

use crate::{
    error::{already_exists, AppResult, FieldErrors},
    middleware::{require_authenticated, require_superuser, Caller},
    models::{CreateRoleRequest, RoleResponse},
    repository::RoleRepository,
    AppState,
};

pub async fn list_roles(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<RoleResponse>>> {
    require_authenticated(&caller)?;

    debug!("Fetching all roles.");
    let roles: Vec<RoleResponse> = state
        .repo
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();
    debug!("Role data retrieved: {} roles", roles.len());
    Ok(Json(roles))
}

/// Superuser only. The guard runs before the body is inspected, so an
/// unprivileged caller sees 401/403 even with a malformed payload.
pub async fn create_role(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RoleResponse>)> {
    let creator = require_superuser(&caller)?;
    let Json(payload) = payload?;

    let name = payload.validate()?;
    if state.repo.role_name_exists(&name).await? {
        return Err(FieldErrors::single("name", already_exists("role", "name")).into());
    }

    let role = state.repo.create_role(&name).await?;
    debug!("Role {} created successfully by {}.", role.name, creator.username);
    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

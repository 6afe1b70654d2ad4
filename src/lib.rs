pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use log::{info, warn};
use tokio::sync::OnceCell;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::SuperuserSeed,
    error::AppResult,
    models::NewUser,
    repository::{Repository, UserRepository},
    utils::hash_password,
};

const DUMMY_PASSWORD: &str = "usermgmt-unknown-user";

/// Shared request state. The store is the only state that outlives a request.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub bcrypt_cost: u32,
    dummy_hash: Arc<OnceCell<String>>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Hash at the configured cost that no stored account matches. Failed
    /// logins for unknown usernames verify against it so they cost the same
    /// as a wrong password.
    pub async fn dummy_hash(&self) -> AppResult<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password(DUMMY_PASSWORD, self.bcrypt_cost))
            .await?;
        Ok(hash.as_str())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route("/api/assign-role", post(handlers::assignments::assign_role))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(1024 * 1024)), // 1MB
        )
        .with_state(state)
}

/// Creates the configured superuser unless the username is already taken.
/// Returns whether a user was created.
pub async fn seed_superuser(state: &AppState, seed: &SuperuserSeed) -> AppResult<bool> {
    if state.repo.username_exists(&seed.username).await? {
        warn!("Superuser {} already exists, skipping seed", seed.username);
        return Ok(false);
    }

    let password_hash = hash_password(&seed.password, state.bcrypt_cost).await?;
    let user = state
        .repo
        .create_user(NewUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: true,
        })
        .await?;

    info!("Created superuser {} ({})", user.username, user.id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repository::MemoryRepository, utils::verify_password};

    #[tokio::test]
    async fn dummy_hash_is_computed_once_at_the_configured_cost() {
        let state = AppState::new(Arc::new(MemoryRepository::new()), 4 /* bcrypt minimum cost */);
        let first = state.dummy_hash().await.unwrap().to_string();
        let second = state.clone().dummy_hash().await.unwrap().to_string();

        assert_eq!(first, second);
        assert!(first.starts_with("$2b$04$"), "{first}");
        assert!(verify_password(DUMMY_PASSWORD, &first).await.unwrap());
    }
}

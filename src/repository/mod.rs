//! Data-access ports used by the handlers.
//!
//! Handlers only see `Arc<dyn Repository>`. [`PostgresRepository`] is the
//! production backend; [`MemoryRepository`] enforces the same uniqueness and
//! reference rules in-process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, Role, User, UserRole};

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} with this {field} already exists")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
    },

    #[error("referenced record does not exist: {0}")]
    ForeignKeyViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in creation order.
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn username_exists(&self, username: &str) -> RepoResult<bool>;
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    /// Removes the user and every assignment referencing it.
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles ordered by name.
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;
    async fn get_role(&self, id: Uuid) -> RepoResult<Option<Role>>;
    async fn role_name_exists(&self, name: &str) -> RepoResult<bool>;
    async fn create_role(&self, name: &str) -> RepoResult<Role>;
    /// Removes the role and every assignment referencing it.
    async fn delete_role(&self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Inserts a join record. Repeating a pair inserts another record.
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<UserRole>;
    /// Roles held by the user, one entry per join record.
    async fn roles_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Role>>;
    async fn count_assignments(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<i64>;
}

/// Everything the HTTP layer needs from a store.
pub trait Repository: UserRepository + RoleRepository + AssignmentRepository {}

impl<T> Repository for T where T: UserRepository + RoleRepository + AssignmentRepository {}

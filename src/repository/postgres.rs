use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AssignmentRepository, RepoResult, RepositoryError, RoleRepository, UserRepository,
};
use crate::models::{NewUser, Role, User, UserRole};

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, \
     is_superuser, is_active, created_at, updated_at";

/// PostgreSQL-backed store. Uniqueness and cascades come from the schema in
/// `migrations/`.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// Translate constraint violations into domain errors; anything else stays a
// database error.
fn map_constraint(err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.constraint() {
            Some("users_username_key") => {
                return RepositoryError::UniqueViolation {
                    entity: "user",
                    field: "username",
                }
            }
            Some("users_email_key") => {
                return RepositoryError::UniqueViolation {
                    entity: "user",
                    field: "email",
                }
            }
            Some("roles_name_key") => {
                return RepositoryError::UniqueViolation {
                    entity: "role",
                    field: "name",
                }
            }
            Some(name) if name.starts_with("user_roles_") => {
                return RepositoryError::ForeignKeyViolation(name.to_string())
            }
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, first_name, last_name,
                               is_superuser, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_superuser)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)?;

        debug!("Inserted user row {}", created.id);
        Ok(created)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleRepository for PostgresRepository {
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn get_role(&self, id: Uuid) -> RepoResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn role_name_exists(&self, name: &str) -> RepoResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_role(&self, name: &str) -> RepoResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)?;
        Ok(role)
    }

    async fn delete_role(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AssignmentRepository for PostgresRepository {
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<UserRole> {
        let assignment = sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, role_id, assigned_at
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)?;
        Ok(assignment)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn count_assignments(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_roles WHERE user_id = $1 AND role_id = $2",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

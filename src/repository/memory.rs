use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AssignmentRepository, RepoResult, RepositoryError, RoleRepository, UserRepository,
};
use crate::models::{NewUser, Role, User, UserRole};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    user_roles: Vec<UserRole>,
    next_user_role_id: i64,
}

/// In-process store with the same constraints as the Postgres schema.
/// Selected with `DATABASE_URL=memory://`; state is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| u.email == email))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::UniqueViolation {
                entity: "user",
                field: "username",
            });
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation {
                entity: "user",
                field: "email",
            });
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            is_superuser: user.is_superuser,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        let removed = tables.users.len() != before;
        if removed {
            tables.user_roles.retain(|ur| ur.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RoleRepository for MemoryRepository {
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut roles = self.tables.read().await.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn get_role(&self, id: Uuid) -> RepoResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn role_name_exists(&self, name: &str) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().any(|r| r.name == name))
    }

    async fn create_role(&self, name: &str) -> RepoResult<Role> {
        let mut tables = self.tables.write().await;
        if tables.roles.iter().any(|r| r.name == name) {
            return Err(RepositoryError::UniqueViolation {
                entity: "role",
                field: "name",
            });
        }
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn delete_role(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.roles.len();
        tables.roles.retain(|r| r.id != id);
        let removed = tables.roles.len() != before;
        if removed {
            tables.user_roles.retain(|ur| ur.role_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AssignmentRepository for MemoryRepository {
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<UserRole> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::ForeignKeyViolation(format!(
                "user {user_id}"
            )));
        }
        if !tables.roles.iter().any(|r| r.id == role_id) {
            return Err(RepositoryError::ForeignKeyViolation(format!(
                "role {role_id}"
            )));
        }

        tables.next_user_role_id += 1;
        let assignment = UserRole {
            id: tables.next_user_role_id,
            user_id,
            role_id,
            assigned_at: Utc::now(),
        };
        tables.user_roles.push(assignment.clone());
        Ok(assignment)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let roles = tables
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .filter_map(|ur| tables.roles.iter().find(|r| r.id == ur.role_id).cloned())
            .collect();
        Ok(roles)
    }

    async fn count_assignments(&self, user_id: Uuid, role_id: Uuid) -> RepoResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id && ur.role_id == role_id)
            .count();
        Ok(count as i64)
    }
}

use std::sync::Arc;

use log::info;
use sqlx::{PgPool, Pool, Postgres};

use crate::{
    config::Config,
    repository::{MemoryRepository, PostgresRepository, RepoResult, Repository},
};

pub type Database = Pool<Postgres>;

pub async fn create_database_pool(database_url: &str) -> Result<Database, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    // Test the connection
    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    info!("Connected to database successfully");
    Ok(pool)
}

/// Builds the store named by `DATABASE_URL`: the in-process store for
/// `memory://`, otherwise Postgres with migrations applied.
pub async fn connect_repository(config: &Config) -> RepoResult<Arc<dyn Repository>> {
    if config.uses_memory_store() {
        info!("Using in-memory store; data will not survive a restart");
        return Ok(Arc::new(MemoryRepository::new()));
    }

    let pool = create_database_pool(&config.database_url).await?;
    let repo = PostgresRepository::new(pool);
    repo.migrate().await?;
    info!("Database migrations applied");
    Ok(Arc::new(repo))
}

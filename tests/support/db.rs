use serverless_kit::{db, routes, services::todo_service::TodoService};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;

/// Migrated in-memory database. A single connection keeps every query on the
/// same in-memory file.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrate");
    pool
}

pub async fn todo_service() -> TodoService {
    TodoService::new(Arc::new(memory_pool().await))
}

pub fn app(service: &TodoService) -> axum::Router {
    routes::routes::app(service.clone())
}

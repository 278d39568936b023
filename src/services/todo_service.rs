//! src/services/todo_service.rs
//!
//! TodoService: list/create/update/delete for to-do items backed by SQLite.
//! Each public operation issues exactly one statement; there is no
//! transactional grouping across calls.

use crate::models::todo::TodoItem;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("to-do item `{0}` not found")]
    NotFound(i64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type TodoResult<T> = Result<T, TodoError>;

const ITEM_COLUMNS: &str = "id, text, completed, created_on";

/// Thin persistence layer for [`TodoItem`].
///
/// The service owns no copy of the data: every call goes straight to the
/// pool, and row ids are whatever SQLite assigns.
#[derive(Clone)]
pub struct TodoService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl TodoService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All items, ordered by text descending.
    pub async fn list(&self) -> TodoResult<Vec<TodoItem>> {
        let items = sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM todo_items ORDER BY text DESC, id DESC"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(items)
    }

    /// Insert a new, not-yet-completed item.
    pub async fn create(&self, text: &str) -> TodoResult<TodoItem> {
        let item = sqlx::query_as::<_, TodoItem>(&format!(
            "INSERT INTO todo_items (text, completed, created_on)
             VALUES (?, 0, ?)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        debug!(id = item.id, "created to-do item");
        Ok(item)
    }

    /// Look up one item by id.
    pub async fn get(&self, id: i64) -> TodoResult<TodoItem> {
        sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM todo_items WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => TodoError::NotFound(id),
            other => TodoError::Sqlx(other),
        })
    }

    /// Overwrite text and completion flag of an existing item.
    ///
    /// Returns NotFound if no row has this id.
    pub async fn update(&self, id: i64, text: &str, completed: bool) -> TodoResult<TodoItem> {
        sqlx::query_as::<_, TodoItem>(&format!(
            "UPDATE todo_items SET text = ?, completed = ?
             WHERE id = ?
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(text)
        .bind(completed)
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => TodoError::NotFound(id),
            other => TodoError::Sqlx(other),
        })
    }

    /// Delete by id. Unknown ids are not an error; the affected row count is
    /// returned instead.
    pub async fn delete(&self, id: i64) -> TodoResult<u64> {
        let result = sqlx::query("DELETE FROM todo_items WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        debug!(id, rows = result.rows_affected(), "deleted to-do item");
        Ok(result.rows_affected())
    }
}

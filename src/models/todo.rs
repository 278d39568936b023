//! Represents a single entry on the to-do list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A to-do item as stored in SQLite.
///
/// The primary key is assigned by the database on insert and is the only
/// handle used for subsequent update and delete lookups.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct TodoItem {
    /// Row id assigned by SQLite (`INTEGER PRIMARY KEY AUTOINCREMENT`).
    pub id: i64,

    /// Free-text content shown on the list page.
    pub text: String,

    /// Whether the item has been ticked off.
    pub completed: bool,

    /// When the item was first created.
    pub created_on: DateTime<Utc>,
}

impl fmt::Display for TodoItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

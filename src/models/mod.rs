//! Data types shared by the handlers, services and command entry points.
//!
//! `TodoItem` maps to the SQLite table via `sqlx::FromRow`; the rest are
//! plain `serde` types describing external payloads (storage events, object
//! addresses, email messages).

pub mod email;
pub mod event;
pub mod object;
pub mod todo;

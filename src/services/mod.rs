//! Service layer: one module per example, each owning its error type.

pub mod kv_store;
pub mod mailer;
pub mod object_store;
pub mod readiness;
pub mod thumbnail;
pub mod todo_service;
pub mod walkthrough;

//! Small serverless building blocks: a to-do web application, a database
//! readiness probe, object-storage and email helpers, a storage-triggered
//! thumbnail function and a key-value store smoke test.
//!
//! The CLI (`src/main.rs`) and the function binaries under `src/bin/` are
//! thin wrappers over the modules here.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;

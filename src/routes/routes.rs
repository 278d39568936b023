//! Defines routes for the to-do web application.
//!
//! ## Structure
//! - `GET  /`       : list page (HTML)
//! - `POST /create` : add an item (`text`)
//! - `POST /update` : edit an item (`id`, `text`, optional `completed`)
//! - `POST /delete` : remove an item (`id`)
//! - `GET  /healthz`, `GET /readyz`: probes
//!
//! Every POST route answers with a redirect to `/`.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        todo_handlers::{create, delete, index, update},
    },
    services::todo_service::TodoService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. It carries `TodoService` as shared state to every
/// handler.
pub fn routes() -> Router<TodoService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/", get(index))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}

/// Router with its state attached, ready to serve.
pub fn app(service: TodoService) -> Router {
    routes().with_state(service)
}

//! HTTP handlers for the to-do list.
//! Form fields are read straight from the request body and handed to
//! `TodoService`; every mutating route redirects back to the list page.

use crate::{errors::AppError, handlers::page, services::todo_service::TodoService};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

pub const LIST_PATH: &str = "/";

/// Body of `POST /create`.
#[derive(Debug, Deserialize)]
pub struct CreateForm {
    pub text: String,
}

/// Body of `POST /update`. A checkbox sends `completed=on` when ticked and
/// nothing at all otherwise.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub id: i64,
    pub text: String,
    pub completed: Option<String>,
}

/// Body of `POST /delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: i64,
}

/// `GET /`: render the list page.
pub async fn index(State(service): State<TodoService>) -> Result<Html<String>, AppError> {
    let items = service.list().await?;
    Ok(Html(page::render_index(&items)))
}

/// `POST /create`
pub async fn create(
    State(service): State<TodoService>,
    Form(form): Form<CreateForm>,
) -> Result<impl IntoResponse, AppError> {
    service.create(&form.text).await?;
    Ok(Redirect::to(LIST_PATH))
}

/// `POST /update`: 404 when the id is unknown.
pub async fn update(
    State(service): State<TodoService>,
    Form(form): Form<UpdateForm>,
) -> Result<impl IntoResponse, AppError> {
    let completed = form.completed.as_deref() == Some("on");
    service.update(form.id, &form.text, completed).await?;
    Ok(Redirect::to(LIST_PATH))
}

/// `POST /delete`
pub async fn delete(
    State(service): State<TodoService>,
    Form(form): Form<DeleteForm>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(form.id).await?;
    Ok(Redirect::to(LIST_PATH))
}

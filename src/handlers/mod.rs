pub mod health_handlers;
pub mod page;
pub mod todo_handlers;

pub mod action_handlers;
pub mod health_handlers;

//! Update handlers: commands, callbacks and the dispatcher schema

pub mod callbacks;
pub mod commands;
pub mod schema;
pub mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};

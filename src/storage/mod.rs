//! Database layer: pool, migrations and the game stores

pub mod catalog;
pub mod db;
pub mod inventory;
pub mod migrations;
pub mod players;
pub mod progress;

// Re-exports for convenience
pub use db::{DbConnection, DbPool, create_pool, get_connection};

//! Handler types and shared dependencies

use std::sync::Arc;

use crate::game::Engine;
use crate::storage::db::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: DbPool,
    pub engine: Arc<Engine>,
}

impl HandlerDeps {
    pub fn new(db_pool: DbPool, engine: Arc<Engine>) -> Self {
        Self { db_pool, engine }
    }
}

//! Shared application state passed to route builders.

use mongodb::{Client, Database};

/// Cloned into routers that need it; the MongoDB handles share one pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Kept so shutdown can drop it explicitly
    pub mongo_client: Client,
    pub db: Database,
}

//! Shared application state.

use database::postgres::DatabaseConnection;

/// Cloned into routers and the shutdown hook; the connection is a pooled handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: DatabaseConnection,
}

//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`errors`]**: `AppError`, the JSON error envelope and error codes
//! - **[`extractors`]**: path and body extractors that reject with `AppError`
//! - **[`server`]**: router assembly with OpenAPI UIs, probes, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{IdPath, UuidPath, ValidatedJson};
pub use server::{create_production_app, create_router, health_router};

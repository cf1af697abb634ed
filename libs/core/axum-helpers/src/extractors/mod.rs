//! Extractors that reject with [`crate::AppError`] instead of axum's plain-text bodies.

pub mod id_path;
pub mod uuid_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use uuid_path::UuidPath;
pub use validated_json::ValidatedJson;

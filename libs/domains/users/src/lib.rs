//! Users Domain
//!
//! User accounts plus administrator-defined custom fields that every
//! account may (or must) fill in at registration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /user and /user-field endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Registration workflow, coercion, password hashing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Traits with in-memory and Postgres implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Accounts, field definitions, field values
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use domain_users::{
//!     fields, handlers, Argon2PasswordHasher, FieldDefinitionService, InMemoryStore, UserService,
//! };
//!
//! // One store backs all three repository traits
//! let store = Arc::new(InMemoryStore::new());
//! let users = UserService::new(store.clone(), store.clone(), store.clone(), Argon2PasswordHasher::new());
//!
//! let router: Router = Router::new()
//!     .nest("/user", handlers::router(users))
//!     .nest("/user-field", fields::handlers::router(FieldDefinitionService::new(store)));
//! ```

pub mod entity;
pub mod error;
pub mod fields;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use fields::models::{
    CreateFieldDefinition, CreateFieldValue, FieldDefinition, FieldValue, NewFieldValue,
    UpdateFieldDefinition, UserFieldValue,
};
pub use fields::repository::{FieldDefinitionRepository, FieldValueRepository};
pub use fields::service::{FieldDefinitionService, FieldValueService, resolve_values};
pub use fields::types::{CanonicalValue, CoercionError, FieldType};
pub use memory::InMemoryStore;
pub use models::{LoginRequest, NewUser, RegisterUser, User, UserDetails, UserResponse};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use postgres::{PgFieldRepository, PgUserRepository};
pub use repository::UserRepository;
pub use service::UserService;

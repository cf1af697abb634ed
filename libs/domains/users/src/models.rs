use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User entity - matches SQL schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    /// Trimmed, lowercased and unique
    pub email: String,
    /// Argon2 PHC string (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh account row from a normalized email and an existing hash
    pub fn new(input: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: input.email,
            password_hash: input.password_hash,
            is_active: true,
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account data handed to the repository once the password is hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// DTO for user registration
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Values keyed by field definition name
    #[serde(default)]
    #[schema(value_type = Object)]
    pub custom_fields: HashMap<String, Value>,
}

/// Returned after a successful registration or login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserDetails {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDetails {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            last_active_at: user.last_active_at,
            created_at: user.created_at,
        }
    }
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Trim and lowercase, the form emails are stored and looked up in
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

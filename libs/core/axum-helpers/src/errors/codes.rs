//! Error codes shared by every service response.
//!
//! Each code has three renderings:
//! - a SCREAMING_SNAKE_CASE identifier for clients
//! - an integer for logs and dashboards
//! - the HTTP status it is served with
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::MissingRequiredFields;
//! assert_eq!(code.as_str(), "MISSING_REQUIRED_FIELDS");
//! assert_eq!(code.code(), 1102);
//! assert_eq!(code.status().as_u16(), 400);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request errors (1000-1099)
    /// Malformed or incomplete request data
    BadRequest,
    /// `validator` rules rejected the body
    ValidationError,
    /// Path segment is not a UUID
    InvalidUuid,
    /// Body could not be read as JSON of the expected shape
    JsonExtraction,
    /// Path segment is not a valid identifier
    InvalidPathParameter,
    NotFound,
    Unauthorized,
    /// Uniqueness or state conflict
    Conflict,

    // Custom-field errors (1100-1199)
    /// A custom field value does not match its declared type
    InvalidFieldValue,
    /// Registration omitted one or more required custom fields
    MissingRequiredFields,
    /// Email/password pair did not verify
    InvalidCredentials,

    // Server errors (5000-5099)
    InternalError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InvalidPathParameter => "INVALID_PATH_PARAMETER",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Conflict => "CONFLICT",
            Self::InvalidFieldValue => "INVALID_FIELD_VALUE",
            Self::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Integer code for structured logs
    pub fn code(&self) -> i32 {
        match self {
            Self::BadRequest => 1000,
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Unauthorized => 1006,
            Self::Conflict => 1008,
            Self::InvalidPathParameter => 1012,
            Self::InvalidFieldValue => 1101,
            Self::MissingRequiredFields => 1102,
            Self::InvalidCredentials => 1103,
            Self::InternalError => 5000,
            Self::ServiceUnavailable => 5003,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest
            | Self::ValidationError
            | Self::InvalidUuid
            | Self::JsonExtraction
            | Self::InvalidPathParameter
            | Self::InvalidFieldValue
            | Self::MissingRequiredFields => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Invalid request",
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::InvalidPathParameter => "Invalid path parameter",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Conflict => "Resource already exists",
            Self::InvalidFieldValue => "Custom field value has the wrong type",
            Self::MissingRequiredFields => "Required custom fields are missing",
            Self::InvalidCredentials => "Invalid email or password",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_form_matches_serde() {
        for code in [
            ErrorCode::BadRequest,
            ErrorCode::InvalidFieldValue,
            ErrorCode::MissingRequiredFields,
            ErrorCode::InvalidCredentials,
            ErrorCode::ServiceUnavailable,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn test_statuses() {
        assert_eq!(ErrorCode::MissingRequiredFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidFieldValue.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert!(ErrorCode::InternalError.is_server_error());
        assert!(!ErrorCode::NotFound.is_server_error());
    }

    #[test]
    fn test_integer_codes_are_unique() {
        let codes = [
            ErrorCode::BadRequest,
            ErrorCode::ValidationError,
            ErrorCode::InvalidUuid,
            ErrorCode::JsonExtraction,
            ErrorCode::InvalidPathParameter,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::Conflict,
            ErrorCode::InvalidFieldValue,
            ErrorCode::MissingRequiredFields,
            ErrorCode::InvalidCredentials,
            ErrorCode::InternalError,
            ErrorCode::ServiceUnavailable,
        ];
        let mut seen: Vec<i32> = codes.iter().map(ErrorCode::code).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), codes.len());
    }
}

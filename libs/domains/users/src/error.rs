use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use serde_json::json;
use thiserror::Error;

use crate::fields::types::FieldType;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid value for field '{field}' (expected {expected}): {reason}")]
    InvalidFieldValue {
        field: String,
        expected: FieldType,
        reason: String,
    },

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        UserError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidInput(msg) => AppError::BadRequest(msg),
            UserError::InvalidFieldValue {
                field,
                expected,
                reason,
            } => AppError::detailed(
                ErrorCode::InvalidFieldValue,
                format!("Invalid value for field '{}': {}", field, reason),
                Some(json!({ "field": field, "expected_type": expected })),
            ),
            err @ UserError::NotFound { .. } => AppError::NotFound(err.to_string()),
            UserError::Conflict(msg) => AppError::Conflict(msg),
            UserError::MissingRequiredFields(names) => AppError::detailed(
                ErrorCode::MissingRequiredFields,
                format!("Missing required fields: {}", names.join(", ")),
                Some(json!({ "missing_fields": names })),
            ),
            UserError::InvalidCredentials => AppError::detailed(
                ErrorCode::InvalidCredentials,
                "Invalid email or password",
                None,
            ),
            UserError::PasswordHash(msg) => {
                AppError::InternalServerError(format!("password hashing: {}", msg))
            }
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_helpers::ErrorResponse;
    use http_body_util::BodyExt;

    async fn render(err: UserError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_required_fields_lists_names() {
        let (status, body) = render(UserError::MissingRequiredFields(vec![
            "department".into(),
            "birthdate".into(),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "MISSING_REQUIRED_FIELDS");
        assert_eq!(
            body.details.unwrap()["missing_fields"],
            json!(["department", "birthdate"])
        );
    }

    #[tokio::test]
    async fn test_invalid_field_value_reports_expected_type() {
        let (status, body) = render(UserError::InvalidFieldValue {
            field: "birthdate".into(),
            expected: FieldType::Date,
            reason: "'soon' is not a YYYY-MM-DD date".into(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = body.details.unwrap();
        assert_eq!(details["field"], "birthdate");
        assert_eq!(details["expected_type"], "date");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (UserError::InvalidInput("email is required".into()), StatusCode::BAD_REQUEST),
            (UserError::not_found("User", "abc"), StatusCode::NOT_FOUND),
            (UserError::Conflict("taken".into()), StatusCode::CONFLICT),
            (UserError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            let (status, _) = render(err).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_not_exposed() {
        for err in [
            UserError::PasswordHash("salt encoding".into()),
            UserError::Internal("connection reset".into()),
        ] {
            let (status, body) = render(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!body.message.contains("salt"));
            assert!(!body.message.contains("connection"));
        }
    }
}

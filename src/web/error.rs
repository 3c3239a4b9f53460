//! API error handling for the tempmail web API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::TempMailError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Conflicts with existing state (409).
    Conflict,
    /// Not found (404).
    NotFound,
    /// Mailbox missing, deactivated or expired (404).
    UnknownMailbox,
    /// Domain not configured (422).
    InvalidDomain,
    /// Validation error (422) - for field-level validation errors.
    ValidationError,
    /// Unprocessable entity (422).
    UnprocessableEntity,
    /// Rate limit exceeded (429).
    TooManyRequests,
    /// Internal server error (500).
    InternalError,
    /// Backing store unavailable (503).
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::NotFound | ErrorCode::UnknownMailbox => StatusCode::NOT_FOUND,
            ErrorCode::InvalidDomain
            | ErrorCode::ValidationError
            | ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Field-level validation error details (only present for validation errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with field-level details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create an unknown mailbox error.
    pub fn unknown_mailbox(address: &str) -> Self {
        Self::new(
            ErrorCode::UnknownMailbox,
            format!("Mailbox {address} does not exist or has expired. Please generate a new address."),
        )
    }

    /// Create an unprocessable entity error.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnprocessableEntity, message)
    }

    /// Create a rate limit error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a service unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Create a validation error with field-level details.
    pub fn validation(details: HashMap<String, Vec<String>>) -> Self {
        Self::with_details(ErrorCode::ValidationError, "Validation failed", details)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        Self::validation(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<TempMailError> for ApiError {
    fn from(err: TempMailError) -> Self {
        match &err {
            TempMailError::InvalidDomain(domain) => Self::new(
                ErrorCode::InvalidDomain,
                format!("Domain {domain} is not available"),
            ),
            TempMailError::UnknownMailbox(address) => Self::unknown_mailbox(address),
            TempMailError::NotFound(_) => Self::not_found(err.to_string()),
            TempMailError::Validation(msg) => Self::unprocessable(msg.clone()),
            TempMailError::AddressExhausted(domain) => Self::new(
                ErrorCode::Conflict,
                format!("No free address left under {domain}, try another domain"),
            ),
            TempMailError::StoreUnavailable(msg) => {
                tracing::warn!("Store unavailable: {}", msg);
                Self::unavailable("Mail store is temporarily unavailable")
            }
            _ => {
                tracing::error!("Internal error: {}", err);
                Self::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::UnknownMailbox.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::InvalidDomain.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::ValidationError.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_from_domain_errors() {
        let err: ApiError = TempMailError::InvalidDomain("example.com".into()).into();
        assert_eq!(err.code, ErrorCode::InvalidDomain);
        assert!(err.message.contains("example.com"));

        let err: ApiError = TempMailError::UnknownMailbox("a@hide-mail.org".into()).into();
        assert_eq!(err.code, ErrorCode::UnknownMailbox);
        assert!(err.message.contains("generate a new address"));

        let err: ApiError = TempMailError::NotFound("email".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "email not found");

        let err: ApiError = TempMailError::StoreUnavailable("timeout".into()).into();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);

        let err: ApiError = TempMailError::AddressExhausted("hide-mail.org".into()).into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.status_code(), StatusCode::CONFLICT);
        assert!(err.message.contains("hide-mail.org"));

        let err: ApiError = TempMailError::Serialization("bad json".into()).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("bad json"));
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::unknown_mailbox("a@hide-mail.org");
        let body = ErrorBody {
            error: ErrorDetail {
                code: err.code,
                message: err.message,
                details: err.details,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "UNKNOWN_MAILBOX");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_validation_error() {
        let mut details = HashMap::new();
        details.insert("address".to_string(), vec!["Too long".to_string()]);

        let err = ApiError::validation(details);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.details.unwrap().get("address").unwrap(),
            &vec!["Too long".to_string()]
        );
    }
}

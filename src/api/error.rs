use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// One field-level validation failure, reported alongside the standard
/// error body with status 422.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError { message: String, errors: Vec<FieldError> },

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError { message, .. } => write!(f, "Validation error: {}", message),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Payload carried on the response extensions so the outermost layer can
/// render the standard error body with the request path filled in.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
    pub field_errors: Vec<FieldError>,
}

/// Error body shape shared by every non-2xx response.
#[derive(Debug, Serialize)]
pub struct StandardError {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match self {
            ApiError::NotFound(message) => ErrorDetails {
                status: StatusCode::NOT_FOUND,
                error: "Resource not found",
                message,
                field_errors: Vec::new(),
            },
            ApiError::ValidationError { message, errors } => ErrorDetails {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: "Validation exception",
                message,
                field_errors: errors,
            },
            ApiError::Conflict(message) => ErrorDetails {
                status: StatusCode::CONFLICT,
                error: "Database exception",
                message,
                field_errors: Vec::new(),
            },
            ApiError::InternalError(message) => {
                tracing::error!("Internal error: {}", message);
                ErrorDetails {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: "Internal server error",
                    message: "An internal error occurred".to_string(),
                    field_errors: Vec::new(),
                }
            }
            ApiError::Unauthorized(message) => ErrorDetails {
                status: StatusCode::UNAUTHORIZED,
                error: "Unauthorized",
                message,
                field_errors: Vec::new(),
            },
            ApiError::Forbidden(message) => ErrorDetails {
                status: StatusCode::FORBIDDEN,
                error: "Forbidden",
                message,
                field_errors: Vec::new(),
            },
        };

        let mut response = details.status.into_response();
        response.extensions_mut().insert(details);
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let text = format!("{err:#}");
        if text.contains("FOREIGN KEY constraint") {
            return ApiError::Conflict("Integrity violation".to_string());
        }
        // Only the email index maps to a field error; other unique
        // violations are unexpected and fall through to 500.
        if text.contains("UNIQUE constraint") && text.contains("users.email") {
            return ApiError::ValidationError {
                message: "Validation failed".to_string(),
                errors: vec![FieldError {
                    field_name: "email".to_string(),
                    message: "Email already in use".to_string(),
                }],
            };
        }
        ApiError::InternalError(text)
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: msg.into(),
            errors: Vec::new(),
        }
    }

    pub fn field_errors(errors: Vec<FieldError>) -> Self {
        ApiError::ValidationError {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

/// Outermost layer. Rewrites any response carrying [`ErrorDetails`] into
/// the standard error body, which needs the request path.
pub async fn standard_error_body(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(details) = response.extensions().get::<ErrorDetails>().cloned() else {
        return response;
    };

    let body = StandardError {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        status: details.status.as_u16(),
        error: details.error.to_string(),
        message: details.message,
        path,
        errors: details.field_errors,
    };

    (details.status, Json(body)).into_response()
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::backend::BackendError;
use crate::wizard::WizardError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    pub fn invalid_identifier(what: &str) -> Self {
        ApiError::BadRequest("INVALID_IDENTIFIER", format!("{what} must be a positive integer"))
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Rejected { status: 401, message } => {
                ApiError::Unauthorized("SESSION_EXPIRED", message)
            }
            BackendError::Rejected { status: 403, message } => ApiError::Forbidden("FORBIDDEN", message),
            BackendError::Rejected { status: 404, message } => ApiError::NotFound("NOT_FOUND", message),
            BackendError::Rejected { status, message } if status < 500 => {
                ApiError::BadRequest("BACKEND_REJECTED", message)
            }
            BackendError::Rejected { message, .. } => ApiError::Upstream(message),
            BackendError::Network(e) => ApiError::Upstream(format!("backend unreachable: {e}")),
            BackendError::Decode(msg) => ApiError::Upstream(msg),
            BackendError::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::InvalidIdentifier => ApiError::invalid_identifier("appointment id"),
            WizardError::SkipNotAllowed(_) => ApiError::Conflict("SKIP_NOT_ALLOWED", e.to_string()),
            WizardError::AlreadyCompleted => ApiError::Conflict("WIZARD_COMPLETED", e.to_string()),
            WizardError::NotCompletable(_) => ApiError::Conflict("NOT_COMPLETABLE", e.to_string()),
            WizardError::Submission(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiError::to_error_response("UPSTREAM_ERROR", &msg),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::to_error_response("INTERNAL", &msg),
            )
                .into_response(),
        }
    }
}

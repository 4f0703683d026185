use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Normalized outcome of every failed operation. None of these end the
/// process; each is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// Bad credentials or empty login fields.
    #[error("authentication failed: {0}")]
    Auth(Cow<'static, str>),
    /// Role or association check refused the action. Raised before any
    /// write is attempted.
    #[error("permission denied: {0}")]
    PermissionDenied(Cow<'static, str>),
    /// Malformed or out-of-range input.
    #[error("invalid input: {0}")]
    Validation(Cow<'static, str>),
    /// Connectivity loss, constraint violation, bad SQL or an unexpected row
    /// shape. Never retried.
    #[error("database error: {reason}")]
    Backend { reason: String },
}

impl Failure {
    pub fn auth(msg: impl Into<Cow<'static, str>>) -> Self {
        Failure::Auth(msg.into())
    }

    pub fn denied(msg: impl Into<Cow<'static, str>>) -> Self {
        Failure::PermissionDenied(msg.into())
    }

    pub fn invalid(msg: impl Into<Cow<'static, str>>) -> Self {
        Failure::Validation(msg.into())
    }

    pub fn backend(reason: impl ToString) -> Self {
        Failure::Backend {
            reason: reason.to_string(),
        }
    }
}

pub enum AppError {
    InternalServerError(anyhow::Error),
    ResponseStatusError(StatusCode, Cow<'static, str>),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct AppErrorResponse {
            status: u16,
            message: Cow<'static, str>,
        }

        match self {
            AppError::InternalServerError(err) => {
                tracing::error!(error = %err, "request failed");
                AppError::from(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                    .into_response()
            }
            AppError::ResponseStatusError(code, s) => (
                code,
                Json(AppErrorResponse {
                    status: code.as_u16(),
                    message: s,
                }),
            )
                .into_response(),
        }
    }
}

impl From<Failure> for AppError {
    fn from(failure: Failure) -> AppError {
        match failure {
            Failure::Auth(msg) => AppError::from(StatusCode::UNAUTHORIZED, msg),
            Failure::PermissionDenied(msg) => AppError::from(StatusCode::FORBIDDEN, msg),
            Failure::Validation(msg) => AppError::from(StatusCode::BAD_REQUEST, msg),
            backend @ Failure::Backend { .. } => AppError::InternalServerError(backend.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> AppError {
        AppError::InternalServerError(e)
    }
}

impl AppError {
    pub fn from(code: StatusCode, s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::ResponseStatusError(code, s.into())
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use envref_core::EnvRefError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub hint: String,
}

impl ErrorEnvelope {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self::new("internal_error", msg, "Check service logs for details")
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ErrorEnvelope,
}

impl AppError {
    pub fn bad_request(code: &str, msg: impl std::fmt::Display, hint: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorEnvelope::new(code, msg.to_string(), hint),
        }
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorEnvelope::internal(&msg.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

impl From<EnvRefError> for AppError {
    fn from(err: EnvRefError) -> Self {
        if matches!(err, EnvRefError::RootNotFound(_)) {
            return Self {
                status: StatusCode::CONFLICT,
                body: ErrorEnvelope::new(
                    "root_not_found",
                    err.to_string(),
                    "Restore the directory or restart the service with other --root values",
                ),
            };
        }
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_root_maps_to_conflict() {
        let err: AppError = EnvRefError::RootNotFound(PathBuf::from("/gone")).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body.code, "root_not_found");
        assert!(err.body.message.contains("/gone"));

        let err: AppError = EnvRefError::Io(std::io::Error::other("disk")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "internal_error");
    }
}

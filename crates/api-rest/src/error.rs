//! Maps core errors onto HTTP responses.

use crate::dto::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use clinica_core::ClinicError;

/// A [`ClinicError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub ClinicError);

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        Self(err)
    }
}

/// Input problems are 422, missing things 404, duplicates 409, rule violations 400, and
/// anything that escaped the use-case boundary 500.
pub fn status_for(err: &ClinicError) -> StatusCode {
    match err {
        ClinicError::Validation(_) | ClinicError::MissingField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClinicError::Conflict(_) => StatusCode::CONFLICT,
        ClinicError::InvalidState(_) | ClinicError::BusinessRule(_) => StatusCode::BAD_REQUEST,
        ClinicError::Repository(_) | ClinicError::Gateway(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            "Internal error".to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorRes {
            status: status.as_u16(),
            message,
            timestamp: chrono::Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinica_core::RepositoryError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ClinicError::Validation("x".into()), 422),
            (ClinicError::MissingField("id"), 422),
            (ClinicError::not_found("appointment", 1), 404),
            (ClinicError::Conflict("x".into()), 409),
            (ClinicError::InvalidState("x".into()), 400),
            (ClinicError::BusinessRule("x".into()), 400),
            (
                ClinicError::Repository(RepositoryError::Poisoned("test")),
                500,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(status_for(&err).as_u16(), expected, "{err}");
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use palmera_core::validate::FieldViolation;
use palmera_pipeline::PipelineError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(Vec<FieldViolation>),
    BadRequest(String),
    NotFoundError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// A submission can only fail on validation or the primary write;
    /// everything else never reaches the handler.
    pub fn from_pipeline(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(validation) => {
                AppError::ValidationError(validation.violations)
            }
            PipelineError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::ValidationError(violations) => {
                let body = Json(json!({
                    "error": "validation failed",
                    "violations": violations,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            other => {
                let (status, error_message) = match other {
                    AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
                    AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
                    AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
                    AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
                    AppError::InternalServerError(msg) => {
                        tracing::error!("Internal Server Error: {}", msg);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal Server Error".to_string(),
                        )
                    }
                    AppError::Anyhow(err) => {
                        tracing::error!("Internal Server Error: {}", err);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal Server Error".to_string(),
                        )
                    }
                    AppError::ValidationError(_) => unreachable!(),
                };
                let body = Json(json!({ "error": error_message }));
                (status, body).into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

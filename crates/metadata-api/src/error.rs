use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metadata_common::Error;
use serde::Serialize;

/// Wraps `metadata_common::Error` so it can be returned directly from an
/// axum handler; maps each taxonomy variant to the HTTP status from the
/// error-handling design.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::PreconditionFailed(_) => StatusCode::CONFLICT,
            Error::NoCapacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if matches!(self.0, Error::Internal(_)) {
            tracing::error!(target: "api", "internal error: {}", self.0);
        } else {
            tracing::warn!(target: "api", "request failed: {}", self.0);
        }
        let body = ErrorBody { error: self.0.kind(), message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

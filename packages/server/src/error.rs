//! Mapping of workflow errors onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error};
use crime_watch_dispatch::DispatchError;

/// An error as returned to API clients: `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 with a client-facing message.
    #[error("{0}")]
    BadRequest(String),

    /// 401 with a client-facing message.
    #[error("{0}")]
    Unauthorized(String),

    /// 404 with a client-facing message.
    #[error("{0}")]
    NotFound(String),

    /// 500; details are logged, never returned.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Maps a dispatch failure to a response.
    ///
    /// Validation messages go to the client verbatim. Store failures are
    /// logged with detail and reported as `failure`.
    pub fn from_dispatch(err: DispatchError, failure: &str) -> Self {
        match err {
            DispatchError::Validation(message) => Self::BadRequest(message),
            DispatchError::Database(e) => {
                log::error!("{failure}: {e}");
                Self::BadRequest(failure.to_string())
            }
            DispatchError::ResponseNotFound { .. } => {
                log::warn!("{failure}: {err}");
                Self::BadRequest(failure.to_string())
            }
            DispatchError::PasswordHash(e) => {
                log::error!("{failure}: {e}");
                Self::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

/// Replaces actix's plain-text JSON extractor errors.
pub fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected request body: {err}");
    ApiError::BadRequest("Invalid request body".to_string()).into()
}

/// Replaces actix's plain-text query extractor errors.
pub fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string: {err}");
    ApiError::BadRequest("Invalid query parameters".to_string()).into()
}

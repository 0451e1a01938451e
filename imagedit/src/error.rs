use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Failure while mapping classified actions onto an image.
#[derive(Debug, thiserror::Error)]
pub enum AdjustmentError {
    #[error("Background removal failed: {0}")]
    BackgroundRemovalFailed(#[from] background_remover::Error),
}

/// Error returned by the HTTP handlers, rendered as `{"detail": "..."}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::warn!("Bad request: {detail}");
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::warn!("Not found: {detail}");
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::error!("Internal error: {detail}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    /// 500 with the `Error processing image: <cause>` detail.
    pub fn processing(cause: impl std::fmt::Display) -> Self {
        Self::internal(format!("Error processing image: {cause}"))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let detail = err.body_text();
        log::warn!("Invalid multipart body ({status}): {detail}");
        Self::new(status, detail)
    }
}

use crate::{error::ApiError, logic::storage, state::AppState};
use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::io;

pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !storage::is_safe_filename(&filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let data = match state.storage.read_processed(&filename).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"));
        }
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };

    let headers = [
        (CONTENT_TYPE, storage::media_type(&filename)),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    Ok((headers, data).into_response())
}

use super::{UploadResponse, read_file_field};
use crate::{error::ApiError, logic::storage, state::AppState};
use axum::{
    Json,
    extract::{Multipart, State},
};

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let file = read_file_field(multipart).await?;
    if !storage::validate_extension(&file.filename) {
        return Err(ApiError::bad_request("Unsupported file type"));
    }

    let filename = storage::generate_filename(&file.filename, "");
    state
        .storage
        .save_upload(&filename, &file.data)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    log::info!("uploaded `{}` as {filename}", file.filename);

    Ok(Json(UploadResponse {
        filename,
        message: "File uploaded successfully".to_string(),
    }))
}

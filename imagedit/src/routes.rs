mod download;
mod health;
mod process;
mod upload;

use crate::{error::ApiError, logic::AdjustmentRecord, state::AppState};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart},
    routing::{get, post},
};
use prompt_classifier::Action;
use serde::Serialize;
use tower_http::cors::CorsLayer;

pub use process::{AiProcessParams, ProcessParams};

const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit();

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/upload/", post(upload::upload))
        .route("/process/", post(process::process))
        .route("/ai_process/", post(process::ai_process))
        .route("/download/{filename}", get(download::download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
}

#[derive(Serialize, Debug, Clone)]
pub struct UploadResponse {
    pub filename: String,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ProcessResponse {
    pub message: String,
    pub processed_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_actions: Option<Vec<Action>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments_applied: Option<AdjustmentRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_status: Option<String>,
}

impl ProcessResponse {
    fn processed(output_filename: &str) -> Self {
        Self {
            message: "Image processed successfully".to_string(),
            processed_url: format!("/download/{output_filename}"),
            ai_actions: None,
            adjustments_applied: None,
            ai_status: None,
        }
    }
}

struct UploadedFile {
    filename: String,
    data: Bytes,
}

// first `file` field of the form
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        log::debug!("received `{filename}` ({} bytes)", data.len());

        return Ok(UploadedFile { filename, data });
    }

    Err(ApiError::bad_request("Missing form field `file`"))
}

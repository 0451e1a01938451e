use super::{ProcessResponse, UploadedFile, read_file_field};
use crate::{
    error::ApiError,
    logic::{AdjustmentRecord, codec, storage},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Query, State, rejection::QueryRejection},
};
use image_effect::{Adjustments, MAX_FACTOR, MIN_FACTOR, NEUTRAL_FACTOR};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct ProcessParams {
    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub brightness: f32,

    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub contrast: f32,

    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub saturation: f32,
}

impl ProcessParams {
    pub fn validate(&self) -> Result<Adjustments, ApiError> {
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if !(MIN_FACTOR..=MAX_FACTOR).contains(&value) {
                return Err(ApiError::bad_request(format!(
                    "{name} must be between {MIN_FACTOR:.1} and {MAX_FACTOR:.1}, got {value}"
                )));
            }
        }

        Ok(Adjustments::new(
            self.brightness,
            self.contrast,
            self.saturation,
        ))
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AiProcessParams {
    pub prompt: String,
}

// generated names for one request
struct Names {
    input: String,
    output: String,
}

impl Names {
    fn for_upload(file: &UploadedFile) -> Result<Self, ApiError> {
        if !storage::validate_extension(&file.filename) {
            return Err(ApiError::bad_request("Unsupported file type"));
        }

        Ok(Self {
            input: storage::generate_filename(&file.filename, ""),
            output: storage::generate_filename(&file.filename, "_processed"),
        })
    }
}

pub async fn process(
    State(state): State<AppState>,
    params: Result<Query<ProcessParams>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let adjustments = params.validate()?;

    let file = read_file_field(multipart).await?;
    let names = Names::for_upload(&file)?;

    state
        .storage
        .save_upload(&names.input, &file.data)
        .await
        .map_err(ApiError::processing)?;

    let data = file.data;
    let output_name = names.output.clone();
    let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let (image, decoded) = codec::decode(&data).map_err(ApiError::processing)?;
        let image = adjustments.apply(&image);
        let format = codec::format_for(&output_name).unwrap_or(decoded);
        codec::encode(&image, format).map_err(ApiError::processing)
    })
    .await
    .map_err(ApiError::processing)??;

    state
        .storage
        .save_processed(&names.output, &encoded)
        .await
        .map_err(ApiError::processing)?;

    Ok(Json(ProcessResponse::processed(&names.output)))
}

pub async fn ai_process(
    State(state): State<AppState>,
    params: Result<Query<AiProcessParams>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let prompt = params.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("Prompt must not be empty"));
    }

    let file = read_file_field(multipart).await?;
    let mut names = Names::for_upload(&file)?;

    let classification = state
        .classifier
        .classify_detailed(&prompt)
        .await
        .map_err(ApiError::processing)?;

    log::info!(
        "AI prompt '{prompt}' found {} actions ({})",
        classification.actions.len(),
        classification.status
    );

    state
        .storage
        .save_upload(&names.input, &file.data)
        .await
        .map_err(ApiError::processing)?;

    let data = file.data;
    let actions = classification.actions.clone();
    let output_name = names.output.clone();
    let worker = state.clone();

    let (encoded, record, background_removed) = tokio::task::spawn_blocking(
        move || -> Result<(Vec<u8>, AdjustmentRecord, bool), ApiError> {
            let (image, decoded) = codec::decode(&data).map_err(ApiError::processing)?;
            let mapped = worker
                .mapper
                .apply_actions(image, &actions)
                .map_err(ApiError::processing)?;

            let format = codec::output_format(
                codec::format_for(&output_name).unwrap_or(decoded),
                mapped.background_removed,
            );
            let encoded = codec::encode(&mapped.image, format).map_err(ApiError::processing)?;

            Ok((encoded, mapped.record, mapped.background_removed))
        },
    )
    .await
    .map_err(ApiError::processing)??;

    if background_removed {
        names.output = storage::replace_extension(&names.output, "png");
    }

    state
        .storage
        .save_processed(&names.output, &encoded)
        .await
        .map_err(ApiError::processing)?;

    Ok(Json(ProcessResponse {
        ai_actions: Some(classification.actions),
        adjustments_applied: Some(record),
        ai_status: Some(classification.status.to_string()),
        ..ProcessResponse::processed(&names.output)
    }))
}

use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

pub const SERVICE_NAME: &str = "ImageEdit AI";

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "Message": format!("Welcome to {SERVICE_NAME}") }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

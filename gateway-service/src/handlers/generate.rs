//! `POST /generate`

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use crate::{config::ResponseMode, startup::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 4000, message = "Prompt must be 1-4000 characters"))]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub script: String,
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(mut payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected /generate body");
        AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
    })?;

    payload.prompt = payload.prompt.trim().to_string();
    payload.validate()?;

    tracing::info!(
        provider = state.text_provider.name(),
        prompt_len = payload.prompt.chars().count(),
        "Prompt received"
    );

    let response = state
        .text_provider
        .generate(&payload.prompt, &state.generation)
        .await
        .map_err(|e| {
            tracing::error!(
                provider = state.text_provider.name(),
                error = %e,
                "Text generation failed"
            );
            AppError::upstream("Something went wrong.")
        })?;

    match (state.response_mode, response.raw) {
        (ResponseMode::Passthrough, Some(raw)) => Ok(Json(raw).into_response()),
        _ => Ok(Json(GenerateResponse {
            script: response.text,
        })
        .into_response()),
    }
}

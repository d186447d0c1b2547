use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CompletionBody, CompletionResponse};
use crate::pipeline::inference::CompletionRequest;

/// `POST /api/completion`: forward a raw prompt to the backend.
pub async fn complete(
    State(ctx): State<ApiContext>,
    body: Result<Json<CompletionBody>, JsonRejection>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let Json(req) = body?;
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".into()));
    }

    let max_tokens = req
        .max_tokens
        .filter(|&t| t > 0)
        .unwrap_or(ctx.labeling.max_tokens);
    let request = CompletionRequest::new(req.prompt, max_tokens)
        .with_temperature(ctx.labeling.temperature);
    let provider = ctx.llm.clone();

    let completion = tokio::task::spawn_blocking(move || {
        provider
            .connect()
            .and_then(|client| client.complete(&request))
            .map_err(|e| ApiError::Inference(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Completion task failed: {e}")))??;

    Ok(Json(CompletionResponse { completion }))
}

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, LabelRequest};
use crate::models::{BatchLabelingResult, DataItem, LabelingIntent};
use crate::pipeline::labeling::{run_labeling, validate_request};

/// `POST /api/label`: label up to 100 items in one request.
pub async fn label(
    State(ctx): State<ApiContext>,
    body: Result<Json<LabelRequest>, JsonRejection>,
) -> Result<Json<BatchLabelingResult>, ApiError> {
    let Json(req) = body?;
    validate_request(&req.data, &req.intent)?;

    let result = run_pipeline(&ctx, req.data, req.intent).await?;
    Ok(Json(result))
}

/// Run the blocking pipeline on a worker thread.
pub(crate) async fn run_pipeline(
    ctx: &ApiContext,
    data: Vec<DataItem>,
    intent: LabelingIntent,
) -> Result<BatchLabelingResult, ApiError> {
    let provider = ctx.llm.clone();
    let config = ctx.labeling.clone();

    tokio::task::spawn_blocking(move || -> Result<BatchLabelingResult, ApiError> {
        let client = provider
            .connect()
            .map_err(|e| ApiError::Labeling(e.to_string()))?;
        run_labeling(client.as_ref(), &data, &intent, &config).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Labeling task failed: {e}")))?
}

//! Session CRUD, review and export over the shared Session Store.
//!
//! Store calls are short synchronous SQLite round-trips made under the
//! store lock; the guard is always released before any `.await`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::api::endpoints::label::run_pipeline;
use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, CompleteSessionRequest, CreateSessionRequest, UpdateResultsRequest,
};
use crate::export::{export_file_name, results_to_csv};
use crate::models::{LabelingSession, SessionSummary};
use crate::pipeline::labeling::validate_request;
use crate::review::{apply_correction, mark_reviewed, review_needed, Acceptance, Correction};

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Session not found: {id}"))
}

/// `GET /api/sessions`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = ctx.sessions()?.list()?;
    Ok(Json(sessions))
}

/// `POST /api/sessions`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LabelingSession>), ApiError> {
    let Json(req) = body?;
    validate_request(&req.data, &req.intent)?;

    let session = ctx.sessions()?.create(&req.name, req.data, req.intent)?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /api/sessions/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<LabelingSession>, ApiError> {
    let session = ctx.sessions()?.get(&id)?.ok_or_else(|| not_found(&id))?;
    Ok(Json(session))
}

/// `DELETE /api/sessions/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if ctx.sessions()?.delete(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

/// `PUT /api/sessions/:id/results`
pub async fn update_results(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateResultsRequest>, JsonRejection>,
) -> Result<Json<LabelingSession>, ApiError> {
    let Json(req) = body?;
    let session = ctx
        .sessions()?
        .update_results(&id, req.results)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(session))
}

/// `POST /api/sessions/:id/complete`: body is optional.
pub async fn complete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Option<Json<CompleteSessionRequest>>,
) -> Result<Json<LabelingSession>, ApiError> {
    let results = body.and_then(|Json(req)| req.results);
    let session = ctx
        .sessions()?
        .complete(&id, results)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(session))
}

/// `POST /api/sessions/:id/corrections`
pub async fn correct(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Result<Json<Correction>, JsonRejection>,
) -> Result<Json<LabelingSession>, ApiError> {
    let Json(correction) = body?;

    let store = ctx.sessions()?;
    let mut session = store.get(&id)?.ok_or_else(|| not_found(&id))?;
    apply_correction(&mut session.results, &correction)?;
    let session = store
        .update_results(&id, session.results)?
        .ok_or_else(|| not_found(&id))?;

    tracing::info!(
        session_id = %id,
        item_id = %correction.item_id,
        review_needed = review_needed(&session.results),
        "Correction applied"
    );
    Ok(Json(session))
}

/// `POST /api/sessions/:id/reviews`: accept one result as-is.
pub async fn accept(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Result<Json<Acceptance>, JsonRejection>,
) -> Result<Json<LabelingSession>, ApiError> {
    let Json(acceptance) = body?;

    let store = ctx.sessions()?;
    let mut session = store.get(&id)?.ok_or_else(|| not_found(&id))?;
    mark_reviewed(&mut session.results, &acceptance.item_id, &acceptance.label)?;
    let session = store
        .update_results(&id, session.results)?
        .ok_or_else(|| not_found(&id))?;

    tracing::info!(
        session_id = %id,
        item_id = %acceptance.item_id,
        review_needed = review_needed(&session.results),
        "Result accepted"
    );
    Ok(Json(session))
}

/// `GET /api/sessions/:id/export`: results as a CSV attachment.
pub async fn export(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = ctx.sessions()?.get(&id)?.ok_or_else(|| not_found(&id))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(&session.name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        results_to_csv(&session.results),
    ))
}

/// `POST /api/sessions/:id/label`: label the session's data and store the results.
pub async fn label(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<LabelingSession>, ApiError> {
    let session = ctx.sessions()?.get(&id)?.ok_or_else(|| not_found(&id))?;

    let batch = run_pipeline(&ctx, session.data, session.intent).await?;

    let updated = ctx
        .sessions()?
        .update_results(&id, batch.results)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(updated))
}

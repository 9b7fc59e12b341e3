//! Repository endpoint handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use permahost_core::Link;
use tracing::instrument;

use crate::error::AppError;
use crate::handlers::response::{RegisterRequest, RepoResponse};
use crate::state::AppState;

/// Handler for GET /api/repos/.
#[instrument(skip_all)]
pub async fn list_repos(State(state): State<AppState>) -> Result<Json<Vec<RepoResponse>>, AppError> {
    let records = state.store().list_all()?;

    let repos = records
        .into_iter()
        .map(|record| {
            let syncing = state.engine().is_syncing(record.link());
            RepoResponse::new(record, syncing)
        })
        .collect();

    Ok(Json(repos))
}

/// Handler for POST /api/repos/.
///
/// Responds once the first sync finished, with its outcome recorded.
#[instrument(skip_all)]
pub async fn register_repo(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RepoResponse>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let raw = request
        .link
        .ok_or_else(|| AppError::BadRequest("Field 'link' is required".to_string()))?;
    let link = Link::parse(&raw)?;

    tracing::info!(link = %link, "Registering repository");

    let record = state.engine().register(&link).await?;
    Ok((StatusCode::CREATED, Json(RepoResponse::new(record, false))))
}

/// Handler for GET /api/repos/{link}.
#[instrument(skip_all, fields(link = %link))]
pub async fn get_repo(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<Json<RepoResponse>, AppError> {
    let record = state.store().get(&link)?;
    let syncing = state.engine().is_syncing(&link);

    Ok(Json(RepoResponse::new(record, syncing)))
}

/// Handler for DELETE /api/repos/{link}.
#[instrument(skip_all, fields(link = %link))]
pub async fn delete_repo(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<StatusCode, AppError> {
    state.engine().remove(&link).await?;
    tracing::info!("Repository deleted");

    Ok(StatusCode::NO_CONTENT)
}

use super::AppState;
use crate::error::ApiError;
use crate::events::ProgressEvent;
use crate::translate::{JobInfo, JobState, TranslateOptions, TranslationSummary};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(flatten)]
    pub options: TranslateOptions,
    /// Return as soon as the job is registered instead of waiting for its summary
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Serialize)]
pub struct StartedResponse {
    pub job: JobInfo,
    pub total_keys: usize,
}

/// POST /api/translate/:code
///
/// The job runs on its own task either way; a foreground request just
/// waits for it, so a dropped connection does not stop the job.
pub async fn start(
    State(state): State<AppState>,
    Path(code): Path<String>,
    request: Option<Json<TranslateRequest>>,
) -> Result<Response, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let job = state.orchestrator.prepare(&code, &request.options)?;
    let started = StartedResponse {
        job: job.info().clone(),
        total_keys: job.total_keys(),
    };
    let handle = state.orchestrator.spawn(job);

    if request.background {
        info!("Started background translation job {} for {}", started.job.id, code);
        return Ok((StatusCode::ACCEPTED, Json(started)).into_response());
    }

    let summary: TranslationSummary = handle
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Translation task failed: {}", e)))?;
    Ok(Json(summary).into_response())
}

/// POST /api/translate/:code/pause
pub async fn pause(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let job = state.orchestrator.state().pause(&code)?;
    state.broadcaster().broadcast(&ProgressEvent::TranslationPaused {
        locale: code,
        job: job.clone(),
    });
    Ok(Json(job))
}

/// POST /api/translate/:code/resume
pub async fn resume(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let job = state.orchestrator.state().resume(&code)?;
    state.broadcaster().broadcast(&ProgressEvent::TranslationResumed {
        locale: code,
        job: job.clone(),
    });
    Ok(Json(job))
}

/// POST /api/translate/:code/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let job = state.orchestrator.state().cancel(&code)?;
    Ok(Json(job))
}

/// POST /api/translate/cancel-all
pub async fn cancel_all(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cancelled = state.orchestrator.state().cancel_all();
    info!("Cancelled {} translation jobs", cancelled.len());
    Json(json!({ "cancelled": cancelled }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: Vec<String>,
    pub paused: Vec<String>,
    pub jobs: Vec<JobInfo>,
}

/// GET /api/translate/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let jobs = state.orchestrator.state().list();
    let locales_in = |wanted: JobState| -> Vec<String> {
        jobs.iter()
            .filter(|j| j.state == wanted)
            .map(|j| j.locale.clone())
            .collect()
    };

    Json(StatusResponse {
        active: locales_in(JobState::Active),
        paused: locales_in(JobState::Paused),
        jobs,
    })
}

use super::AppState;
use crate::compare::{diff, find_identical_values, DiffCounts, KeyValue, UntranslatableConfig};
use crate::error::ApiError;
use crate::locale::{FlatKeys, LocaleSummary};
use crate::metrics::MetricsReport;
use crate::translate::JobInfo;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct LocaleOverview {
    #[serde(flatten)]
    pub summary: LocaleSummary,
    pub missing: usize,
    pub identical: usize,
    pub completeness: f64,
    pub job: Option<JobInfo>,
}

#[derive(Debug, Serialize)]
pub struct LocalesResponse {
    pub reference: String,
    pub locales: Vec<LocaleOverview>,
}

/// GET /api/locales
pub async fn list_locales(State(state): State<AppState>) -> Json<LocalesResponse> {
    let reference = state.store.reference_keys();
    let filter = state.untranslatable.get().identical_filter();
    let jobs = state.orchestrator.state();

    let locales = state
        .store
        .summaries()
        .into_iter()
        .map(|summary| {
            let job = jobs.get(&summary.code);
            if summary.is_reference {
                return LocaleOverview {
                    summary,
                    missing: 0,
                    identical: 0,
                    completeness: 100.0,
                    job,
                };
            }
            let keys = state.store.keys(&summary.code).unwrap_or_default();
            let result = diff(&reference, &keys);
            LocaleOverview {
                missing: result.missing.len(),
                identical: find_identical_values(&reference, &keys, &filter).len(),
                completeness: result.completeness(),
                summary,
                job,
            }
        })
        .collect();

    Json(LocalesResponse {
        reference: state.store.reference_code().to_string(),
        locales,
    })
}

/// POST /api/locales/reload
pub async fn reload_locales(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let loaded = state.store.load()?;
    Ok(Json(json!({ "loaded": loaded })))
}

/// GET /api/locales/:code
pub async fn get_locale(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<crate::locale::Locale>, ApiError> {
    state
        .store
        .get(&code)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown locale '{}'", code)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeysRequest {
    pub keys: FlatKeys,
}

/// PUT /api/locales/:code/keys
pub async fn update_keys(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<UpdateKeysRequest>,
) -> Result<Json<Value>, ApiError> {
    state.require_locale(&code)?;
    state.ensure_no_job(&code)?;
    if request.keys.is_empty() {
        return Err(ApiError::BadRequest("No keys to update".to_string()));
    }

    let updates: Vec<(String, String)> = request.keys.into_iter().collect();
    state.store.update_keys(&code, &updates)?;
    info!("Updated {} keys in {}", updates.len(), code);
    Ok(Json(json!({ "locale": code, "updated": updates.len() })))
}

#[derive(Debug, Deserialize)]
pub struct RemoveKeysRequest {
    pub keys: Vec<String>,
}

/// DELETE /api/locales/:code/keys
pub async fn remove_keys(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<RemoveKeysRequest>,
) -> Result<Json<Value>, ApiError> {
    state.require_locale(&code)?;
    state.ensure_no_job(&code)?;

    let removed = state.store.remove_keys(&code, &request.keys)?;
    info!("Removed {} keys from {}", removed, code);
    Ok(Json(json!({ "locale": code, "removed": removed })))
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub locale: String,
    pub reference: String,
    pub counts: DiffCounts,
    pub completeness: f64,
    #[serde(flatten)]
    pub diff: crate::compare::LocaleDiff,
}

/// GET /api/compare/:code
pub async fn compare_locale(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CompareResponse>, ApiError> {
    state.require_locale(&code)?;
    let target = state.store.keys(&code).unwrap_or_default();
    let result = diff(&state.store.reference_keys(), &target);

    Ok(Json(CompareResponse {
        locale: code,
        reference: state.store.reference_code().to_string(),
        counts: result.counts(),
        completeness: result.completeness(),
        diff: result,
    }))
}

#[derive(Debug, Serialize)]
pub struct IdenticalResponse {
    pub locale: String,
    pub count: usize,
    pub values: Vec<KeyValue>,
}

/// GET /api/compare/:code/identical
pub async fn identical_values(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<IdenticalResponse>, ApiError> {
    state.require_locale(&code)?;
    let target = state.store.keys(&code).unwrap_or_default();
    let filter = state.untranslatable.get().identical_filter();
    let values = find_identical_values(&state.store.reference_keys(), &target, &filter);

    Ok(Json(IdenticalResponse {
        locale: code,
        count: values.len(),
        values,
    }))
}

/// GET /api/untranslatable-config
pub async fn get_untranslatable_config(State(state): State<AppState>) -> Json<UntranslatableConfig> {
    Json(state.untranslatable.get())
}

/// PUT /api/untranslatable-config
pub async fn put_untranslatable_config(
    State(state): State<AppState>,
    Json(config): Json<UntranslatableConfig>,
) -> Result<Json<UntranslatableConfig>, ApiError> {
    config
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("{:#}", e)))?;
    state.untranslatable.replace(config.clone())?;
    Ok(Json(config))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub metrics: MetricsReport,
    pub connected_clients: usize,
    pub jobs: Vec<JobInfo>,
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        metrics: state.orchestrator.metrics().report(),
        connected_clients: state.broadcaster().client_count(),
        jobs: state.orchestrator.state().list(),
    })
}

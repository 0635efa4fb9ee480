use super::AppState;
use crate::compare::{find_non_translatable, KeyValue, NonTranslatable};
use crate::error::ApiError;
use crate::scanner::{
    clean_untranslatable as inline_untranslatable, clean_wrappers as unwrap_values,
    missing_in_code as unused_keys, orphaned_in_code, restore_keys, scan_for_redundant_wrappers,
    scan_for_usage, FileError, KeyUsage, RestoreReport, RewriteReport, UntranslatableCleanReport,
    UntranslatableReplacement, WrapperScan,
};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Run file-system work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Scan task failed: {}", e)))?
        .map_err(ApiError::Internal)
}

#[derive(Debug, Serialize)]
pub struct OrphanedResponse {
    pub count: usize,
    pub orphaned: Vec<KeyUsage>,
    pub files_scanned: usize,
    pub files_with_translations: usize,
    pub errors: Vec<FileError>,
}

/// GET /api/scan/orphaned
pub async fn orphaned(State(state): State<AppState>) -> Result<Json<OrphanedResponse>, ApiError> {
    let response = blocking(move || {
        let files = state.sources.files()?;
        let scan = scan_for_usage(&state.sources.root, &files);
        let orphaned = orphaned_in_code(&scan.usages, &state.store.key_sets());
        Ok(OrphanedResponse {
            count: orphaned.len(),
            orphaned,
            files_scanned: scan.files_scanned,
            files_with_translations: scan.files_with_translations,
            errors: scan.errors,
        })
    })
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct MissingInCodeResponse {
    pub count: usize,
    pub missing: Vec<KeyValue>,
    pub files_scanned: usize,
    pub errors: Vec<FileError>,
}

/// GET /api/scan/missing-in-code
pub async fn missing_in_code(
    State(state): State<AppState>,
) -> Result<Json<MissingInCodeResponse>, ApiError> {
    let response = blocking(move || {
        let files = state.sources.files()?;
        let scan = scan_for_usage(&state.sources.root, &files);
        let missing = unused_keys(&state.store.reference_keys(), &scan.usages);
        Ok(MissingInCodeResponse {
            count: missing.len(),
            missing,
            files_scanned: scan.files_scanned,
            errors: scan.errors,
        })
    })
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct UntranslatableQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UntranslatableResponse {
    pub locale: String,
    pub count: usize,
    pub items: Vec<NonTranslatable>,
}

/// GET /api/scan/untranslatable?locale=
pub async fn untranslatable(
    State(state): State<AppState>,
    Query(query): Query<UntranslatableQuery>,
) -> Result<Json<UntranslatableResponse>, ApiError> {
    let locale = query
        .locale
        .unwrap_or_else(|| state.store.reference_code().to_string());
    state.require_locale(&locale)?;

    let keys = state.store.keys(&locale).unwrap_or_default();
    let patterns = state.untranslatable.get().compiled_patterns();
    let items = find_non_translatable(&keys, &patterns);
    Ok(Json(UntranslatableResponse {
        locale,
        count: items.len(),
        items,
    }))
}

/// GET /api/scan/wrappers
pub async fn wrappers(State(state): State<AppState>) -> Result<Json<WrapperScan>, ApiError> {
    let scan = blocking(move || {
        let files = state.sources.files()?;
        Ok(scan_for_redundant_wrappers(&state.sources.root, &files))
    })
    .await?;
    Ok(Json(scan))
}

#[derive(Debug, Deserialize)]
pub struct CleanWrappersRequest {
    pub values: Vec<String>,
}

/// POST /api/clean/wrappers
pub async fn clean_wrappers(
    State(state): State<AppState>,
    Json(request): Json<CleanWrappersRequest>,
) -> Result<Json<RewriteReport>, ApiError> {
    if request.values.is_empty() {
        return Err(ApiError::BadRequest("No values selected".to_string()));
    }
    let report = blocking(move || {
        let files = state.sources.files()?;
        Ok(unwrap_values(&state.sources.root, &files, &request.values))
    })
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CleanUntranslatableRequest {
    pub items: Vec<UntranslatableReplacement>,
}

/// POST /api/clean/untranslatable
pub async fn clean_untranslatable(
    State(state): State<AppState>,
    Json(request): Json<CleanUntranslatableRequest>,
) -> Result<Json<UntranslatableCleanReport>, ApiError> {
    if request.items.is_empty() {
        return Err(ApiError::BadRequest("No keys selected".to_string()));
    }
    state.ensure_no_jobs()?;

    let report = blocking(move || {
        let files = state.sources.files()?;
        Ok(inline_untranslatable(
            &state.sources.root,
            &files,
            &state.store,
            &request.items,
        ))
    })
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct RestoreRequest {
    /// Keys to restore; all orphaned keys when empty
    #[serde(default)]
    pub keys: Vec<String>,
}

/// POST /api/restore
pub async fn restore(
    State(state): State<AppState>,
    request: Option<Json<RestoreRequest>>,
) -> Result<Json<RestoreReport>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    state.ensure_no_jobs()?;

    let report = blocking(move || {
        let keys = if request.keys.is_empty() {
            let files = state.sources.files()?;
            let scan = scan_for_usage(&state.sources.root, &files);
            orphaned_in_code(&scan.usages, &state.store.key_sets())
                .into_iter()
                .map(|usage| usage.full_key)
                .collect()
        } else {
            request.keys
        };
        Ok(restore_keys(&state.store, &keys))
    })
    .await?;
    Ok(Json(report))
}

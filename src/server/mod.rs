//! HTTP and WebSocket surface.
//!
//! ## Endpoints
//! - `/api/locales`, `/api/compare`: locale listing, editing and comparison
//! - `/api/translate`: translation jobs and their control
//! - `/api/scan`, `/api/clean`, `/api/restore`: source scans and rewrites
//! - `/api/untranslatable-config`, `/api/stats`
//! - `/ws`: progress events
//!
//! No authentication; bind to a trusted interface.

mod locales;
mod scan;
mod translation;
mod ws;

use crate::broadcast::Broadcaster;
use crate::compare::UntranslatableConfigStore;
use crate::config::Config;
use crate::error::ApiError;
use crate::locale::LocaleStore;
use crate::retry::RetryConfig;
use crate::scanner::list_source_files;
use crate::translate::{CliTranslator, Orchestrator, Translator};
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The frontend tree that scans and rewrites operate on.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
    pub excluded_dirs: Vec<String>,
}

impl SourceTree {
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        list_source_files(&self.root, &self.excluded_dirs)
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocaleStore>,
    pub untranslatable: Arc<UntranslatableConfigStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub sources: Arc<SourceTree>,
}

impl AppState {
    /// Assemble the service from its parts.
    pub fn new(
        store: Arc<LocaleStore>,
        untranslatable: Arc<UntranslatableConfigStore>,
        orchestrator: Arc<Orchestrator>,
        sources: SourceTree,
    ) -> Self {
        Self {
            store,
            untranslatable,
            orchestrator,
            sources: Arc::new(sources),
        }
    }

    /// Load locales and the untranslatable config, and wire up the CLI translator.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(
            LocaleStore::open(&config.messages_dir, &config.reference_locale)
                .context("Failed to load locale files")?,
        );
        let untranslatable = Arc::new(UntranslatableConfigStore::open(&config.untranslatable_config)?);
        let translator: Arc<dyn Translator> = Arc::new(CliTranslator::from_config(config));
        let orchestrator = Orchestrator::new(
            store.clone(),
            untranslatable.clone(),
            translator,
            Broadcaster::default(),
        )
        .with_batching(config.default_batch_size, config.batch_delay)
        .with_retry(RetryConfig::translator(config.translator_max_attempts));

        Ok(Self::new(
            store,
            untranslatable,
            Arc::new(orchestrator),
            SourceTree {
                root: config.frontend_dir.clone(),
                excluded_dirs: config.excluded_dirs.clone(),
            },
        ))
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        self.orchestrator.broadcaster()
    }

    fn require_locale(&self, code: &str) -> Result<(), ApiError> {
        if self.store.contains(code) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("Unknown locale '{}'", code)))
        }
    }

    /// Direct edits of a locale are refused while a job writes to it.
    fn ensure_no_job(&self, code: &str) -> Result<(), ApiError> {
        match self.orchestrator.state().get(code) {
            Some(job) => Err(ApiError::Conflict(format!(
                "Translation job {} is running for locale '{}'",
                job.id, code
            ))),
            None => Ok(()),
        }
    }

    /// Source rewrites touch every locale, so they need all jobs stopped.
    fn ensure_no_jobs(&self) -> Result<(), ApiError> {
        let jobs = self.orchestrator.state().list();
        if jobs.is_empty() {
            return Ok(());
        }
        let locales: Vec<&str> = jobs.iter().map(|j| j.locale.as_str()).collect();
        Err(ApiError::Conflict(format!(
            "Translation in progress for: {}",
            locales.join(", ")
        )))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Locales and comparison
        .route("/api/locales", get(locales::list_locales))
        .route("/api/locales/reload", post(locales::reload_locales))
        .route("/api/locales/:code", get(locales::get_locale))
        .route(
            "/api/locales/:code/keys",
            axum::routing::put(locales::update_keys).delete(locales::remove_keys),
        )
        .route("/api/compare/:code", get(locales::compare_locale))
        .route("/api/compare/:code/identical", get(locales::identical_values))
        .route(
            "/api/untranslatable-config",
            get(locales::get_untranslatable_config).put(locales::put_untranslatable_config),
        )
        .route("/api/stats", get(locales::stats))
        // Translation jobs
        .route("/api/translate/status", get(translation::status))
        .route("/api/translate/cancel-all", post(translation::cancel_all))
        .route("/api/translate/:code", post(translation::start))
        .route("/api/translate/:code/pause", post(translation::pause))
        .route("/api/translate/:code/resume", post(translation::resume))
        .route("/api/translate/:code/cancel", post(translation::cancel))
        // Scans and rewrites
        .route("/api/scan/orphaned", get(scan::orphaned))
        .route("/api/scan/missing-in-code", get(scan::missing_in_code))
        .route("/api/scan/untranslatable", get(scan::untranslatable))
        .route("/api/scan/wrappers", get(scan::wrappers))
        .route("/api/clean/wrappers", post(scan::clean_wrappers))
        .route("/api/clean/untranslatable", post(scan::clean_untranslatable))
        .route("/api/restore", post(scan::restore))
        // Progress
        .route("/ws", get(ws::progress_socket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C, then cancel running jobs.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let orchestrator = state.orchestrator.clone();
    let app = router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("✓ Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let cancelled = orchestrator.state().cancel_all();
    if !cancelled.is_empty() {
        info!("Cancelled {} running translation job(s) on shutdown", cancelled.len());
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

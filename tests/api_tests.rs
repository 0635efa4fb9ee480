//! HTTP API tests
//!
//! These drive the axum router in-process with `tower::ServiceExt::oneshot`,
//! against temporary locale and source trees and an in-process translator.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use tower::ServiceExt;

use translation_manager::broadcast::Broadcaster;
use translation_manager::compare::{UntranslatableConfig, UntranslatableConfigStore};
use translation_manager::error::TranslatorError;
use translation_manager::locale::LocaleStore;
use translation_manager::server::{router, AppState, SourceTree};
use translation_manager::translate::{BatchRequest, Orchestrator, Translator};

// ==================== Test Helpers ====================

/// Prefixes every text with `[locale]`, once its gate is open.
struct GatedTranslator {
    open: watch::Receiver<bool>,
}

#[async_trait]
impl Translator for GatedTranslator {
    async fn translate_batch(&self, request: &BatchRequest) -> Result<Vec<String>, TranslatorError> {
        let mut open = self.open.clone();
        let _ = open.wait_for(|open| *open).await;
        Ok(request
            .texts
            .iter()
            .map(|text| format!("[{}] {}", request.locale, text))
            .collect())
    }
}

const EN: &str = r#"{
  "home": { "welcome": "Welcome", "save": "Save", "title": "Dashboard" },
  "errors": { "required": "This field is required" }
}"#;

const ES: &str = r#"{ "home": { "welcome": "Bienvenido", "title": "Dashboard" } }"#;

const PAGE: &str = r#"import { useTranslations } from "next-intl";

export default function Home() {
  const t = useTranslations("home");
  return (
    <main>
      <h1>{t("welcome")}</h1>
      <p>{t("ghost")}</p>
      <button>{"Go"}</button>
    </main>
  );
}
"#;

struct TestApp {
    _dir: TempDir,
    app: Router,
    state: AppState,
    gate: watch::Sender<bool>,
}

fn create_test_app(gate_open: bool) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let messages = dir.path().join("messages");
    let frontend = dir.path().join("frontend");
    std::fs::create_dir_all(&messages).unwrap();
    std::fs::create_dir_all(frontend.join("app")).unwrap();
    std::fs::write(messages.join("en.json"), EN).unwrap();
    std::fs::write(messages.join("es.json"), ES).unwrap();
    std::fs::write(frontend.join("app/page.tsx"), PAGE).unwrap();

    let store = Arc::new(LocaleStore::open(&messages, "en").unwrap());
    let untranslatable = Arc::new(UntranslatableConfigStore::in_memory(
        UntranslatableConfig::default(),
        dir.path().join("untranslatable-config.json"),
    ));
    let (gate, open) = watch::channel(gate_open);
    let orchestrator = Orchestrator::new(
        store.clone(),
        untranslatable.clone(),
        Arc::new(GatedTranslator { open }),
        Broadcaster::default(),
    )
    .with_batching(2, Duration::ZERO);

    let state = AppState::new(
        store,
        untranslatable,
        Arc::new(orchestrator),
        SourceTree {
            root: frontend,
            excluded_dirs: vec!["node_modules".to_string()],
        },
    );

    TestApp {
        _dir: dir,
        app: router(state.clone()),
        state,
        gate,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn wait_until_idle(app: &Router) {
    for _ in 0..100 {
        let (_, status) = send(app, "GET", "/api/translate/status", None).await;
        if status["jobs"].as_array().is_some_and(|jobs| jobs.is_empty()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("translation job did not finish");
}

// ==================== Locale Tests ====================

#[tokio::test]
async fn test_list_locales_reports_missing_and_identical() {
    let t = create_test_app(true);
    let (status, body) = send(&t.app, "GET", "/api/locales", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reference"], "en");
    let es = body["locales"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["code"] == "es")
        .unwrap();
    assert_eq!(es["display_name"], "Spanish");
    assert_eq!(es["missing"], 2);
    assert_eq!(es["identical"], 1);
    assert!(es["job"].is_null());
}

#[tokio::test]
async fn test_unknown_locale_is_404() {
    let t = create_test_app(true);

    let (status, body) = send(&t.app, "GET", "/api/locales/zz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("zz"));

    let (status, _) = send(&t.app, "GET", "/api/compare/zz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_compare_against_reference() {
    let t = create_test_app(true);
    let (status, body) = send(&t.app, "GET", "/api/compare/es", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["missing"], 2);
    assert_eq!(body["counts"]["different"], 1);
    assert_eq!(body["missing"][0]["key"], "home.save");
    assert_eq!(body["completeness"], 50.0);
}

#[tokio::test]
async fn test_update_and_remove_keys() {
    let t = create_test_app(true);

    let (status, body) = send(
        &t.app,
        "PUT",
        "/api/locales/es/keys",
        Some(json!({ "keys": { "home.save": "Guardar" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
    assert_eq!(t.state.store.keys("es").unwrap()["home.save"], "Guardar");

    let (status, body) = send(
        &t.app,
        "DELETE",
        "/api/locales/es/keys",
        Some(json!({ "keys": ["home.title", "home.unknown"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);
    assert!(!t.state.store.keys("es").unwrap().contains_key("home.title"));

    let on_disk = std::fs::read_to_string(t.state.store.path_for("es")).unwrap();
    assert!(on_disk.contains("Guardar"));
}

#[tokio::test]
async fn test_untranslatable_config_rejects_invalid_pattern() {
    let t = create_test_app(true);
    let invalid = json!({
        "patterns": [{ "name": "broken", "pattern": "(", "policy": "keep_self" }]
    });

    let (status, body) = send(&t.app, "PUT", "/api/untranslatable-config", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("broken"));

    let (_, current) = send(&t.app, "GET", "/api/untranslatable-config", None).await;
    assert!(current["patterns"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["name"] != "broken"));
}

// ==================== Translation Tests ====================

#[tokio::test]
async fn test_foreground_translation_saves_missing_keys() {
    let t = create_test_app(true);
    let (status, summary) = send(&t.app, "POST", "/api/translate/es", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_keys"], 2);
    assert_eq!(summary["success_count"], 2);
    assert_eq!(summary["cancelled"], false);

    let es = t.state.store.keys("es").unwrap();
    assert_eq!(es["home.save"], "[es] Save");
    assert_eq!(es["errors.required"], "[es] This field is required");
    // Existing translations are left alone in missing mode
    assert_eq!(es["home.welcome"], "Bienvenido");

    let (_, stats) = send(&t.app, "GET", "/api/stats", None).await;
    assert_eq!(stats["metrics"]["keys_translated"], 2);
    assert_eq!(stats["metrics"]["jobs_completed"], 1);
}

#[tokio::test]
async fn test_translate_reference_locale_is_rejected() {
    let t = create_test_app(true);
    let (status, _) = send(&t.app, "POST", "/api/translate/en", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/translate/es",
        Some(json!({ "batch_size": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_running_job_blocks_conflicting_requests() {
    let t = create_test_app(false);

    let (status, started) = send(
        &t.app,
        "POST",
        "/api/translate/es",
        Some(json!({ "background": true, "mode": "both" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(started["total_keys"], 3);
    assert_eq!(started["job"]["mode"], "both");

    let (status, _) = send(&t.app, "POST", "/api/translate/es", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &t.app,
        "PUT",
        "/api/locales/es/keys",
        Some(json!({ "keys": { "home.save": "Guardar" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&t.app, "POST", "/api/restore", Some(json!({ "keys": ["x.y"] }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    t.gate.send_replace(true);
    wait_until_idle(&t.app).await;

    let es = t.state.store.keys("es").unwrap();
    assert_eq!(es["home.title"], "[es] Dashboard");
    assert_eq!(es.len(), 4);
}

#[tokio::test]
async fn test_pause_and_cancel_job() {
    let t = create_test_app(false);
    let (status, _) = send(
        &t.app,
        "POST",
        "/api/translate/es",
        Some(json!({ "background": true })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, job) = send(&t.app, "POST", "/api/translate/es/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["state"], "paused");

    let (status, _) = send(&t.app, "POST", "/api/translate/es/pause", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&t.app, "GET", "/api/translate/status", None).await;
    assert_eq!(body["paused"], json!(["es"]));
    assert_eq!(body["active"], json!([]));

    let (status, _) = send(&t.app, "POST", "/api/translate/es/cancel", None).await;
    assert_eq!(status, StatusCode::OK);
    wait_until_idle(&t.app).await;

    // The batch that was in flight is never saved
    t.gate.send_replace(true);
    assert!(!t.state.store.keys("es").unwrap().contains_key("home.save"));
    assert!(t.state.orchestrator.state().is_cancelled("es"));

    let (status, _) = send(&t.app, "POST", "/api/translate/es/resume", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_all() {
    let t = create_test_app(false);
    send(&t.app, "POST", "/api/translate/es", Some(json!({ "background": true }))).await;

    let (status, body) = send(&t.app, "POST", "/api/translate/cancel-all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"].as_array().unwrap().len(), 1);
    wait_until_idle(&t.app).await;
}

// ==================== Scan Tests ====================

#[tokio::test]
async fn test_scan_orphaned_and_unused_keys() {
    let t = create_test_app(true);

    let (status, body) = send(&t.app, "GET", "/api/scan/orphaned", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["orphaned"][0]["full_key"], "home.ghost");
    assert_eq!(body["files_with_translations"], 1);

    let (status, body) = send(&t.app, "GET", "/api/scan/missing-in-code", None).await;
    assert_eq!(status, StatusCode::OK);
    let unused: Vec<&str> = body["missing"]
        .as_array()
        .unwrap()
        .iter()
        .map(|kv| kv["key"].as_str().unwrap())
        .collect();
    assert_eq!(unused, vec!["home.save", "home.title", "errors.required"]);
}

#[tokio::test]
async fn test_restore_orphaned_keys() {
    let t = create_test_app(true);
    let (status, body) = send(&t.app, "POST", "/api/restore", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restored"][0]["key"], "home.ghost");
    assert_eq!(body["restored"][0]["value"], "Ghost");
    assert_eq!(body["added"]["en"], 1);
    assert_eq!(body["added"]["es"], 1);
    assert_eq!(t.state.store.keys("en").unwrap()["home.ghost"], "Ghost");
}

#[tokio::test]
async fn test_scan_and_clean_wrappers() {
    let t = create_test_app(true);

    let (status, body) = send(&t.app, "GET", "/api/scan/wrappers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["findings"][0]["value"], "Go");
    assert_eq!(body["findings"][0]["position"], "child");

    let (status, _) = send(&t.app, "POST", "/api/clean/wrappers", Some(json!({ "values": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/clean/wrappers",
        Some(json!({ "values": ["Go"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_replacements"], 1);

    let page = std::fs::read_to_string(t.state.sources.root.join("app/page.tsx")).unwrap();
    assert!(page.contains("<button>Go</button>"));
}

#[tokio::test]
async fn test_scan_untranslatable_defaults_to_reference() {
    let t = create_test_app(true);
    t.state
        .store
        .update_keys("en", &[("home.sep".to_string(), " - ".to_string())])
        .unwrap();

    let (status, body) = send(&t.app, "GET", "/api/scan/untranslatable", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locale"], "en");
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["key"], "home.sep");
    assert_eq!(body["items"][0]["pattern"], "punctuation");

    let (status, _) = send(&t.app, "GET", "/api/scan/untranslatable?locale=zz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

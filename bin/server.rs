// Garlic Archive - API Server
// REST API with Axum over the same store, intake and derived views as the TUI

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{Local, NaiveDate};
use garlic_archive::{
    parse_ledger_date, snapshot, Entry, EntryCandidate, EntryFilter, EntryPatch, EntryStore,
    GeminiParser, Intake, LedgerConfig, LedgerError, LedgerSnapshot, SqliteRepository,
    SummaryStats, ViewMode, YearGranularity,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<EntryStore<SqliteRepository>>>,
    /// None when no parsing service key is configured
    intake: Option<Arc<Intake<GeminiParser>>>,
}

impl AppState {
    fn store(&self) -> Result<MutexGuard<'_, EntryStore<SqliteRepository>>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::internal("ledger store lock poisoned"))
    }

    fn intake(&self) -> Result<Arc<Intake<GeminiParser>>, ApiError> {
        self.intake.clone().ok_or_else(|| ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "parsing service is not configured (set GEMINI_API_KEY)".to_string(),
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::Input(_) | LedgerError::DeviceAccess(_) => StatusCode::BAD_REQUEST,
            LedgerError::ParseFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %err, "request failed");
        }
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioRequest {
    /// Base64 recording
    data: String,
    mime_type: String,
}

#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    filter: EntryFilter,
}

#[derive(Deserialize)]
struct SnapshotQuery {
    #[serde(default = "default_view")]
    view: ViewMode,
    #[serde(default = "default_granularity")]
    granularity: YearGranularity,
    /// Anchor date, defaults to the local date
    today: Option<String>,
}

fn default_view() -> ViewMode {
    ViewMode::Week
}

fn default_granularity() -> YearGranularity {
    YearGranularity::ByMonth
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/entries?filter=all|income|expense - Archive, newest first
async fn list_entries(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Entry>> {
    let store = state.store()?;
    let entries = store.newest_first(query.filter).into_iter().cloned().collect();
    Ok(Json(ApiResponse::ok(entries)))
}

/// POST /api/entries - Parse free text and commit the result
async fn add_from_text(State(state): State<AppState>, Json(req): Json<TextRequest>) -> ApiResult<Entry> {
    let intake = state.intake()?;
    // Parse before taking the store lock
    let candidate = intake.from_text(&req.text, local_today()).await?;
    commit(&state, candidate, true)
}

/// POST /api/entries/audio - Parse a base64 recording and commit the result
async fn add_from_audio(State(state): State<AppState>, Json(req): Json<AudioRequest>) -> ApiResult<Entry> {
    let intake = state.intake()?;
    let candidate = intake.from_audio(&req.data, &req.mime_type, local_today()).await?;
    commit(&state, candidate, true)
}

/// POST /api/entries/manual - Commit a fully specified candidate
async fn add_manual(State(state): State<AppState>, Json(candidate): Json<EntryCandidate>) -> ApiResult<Entry> {
    commit(&state, candidate, false)
}

fn commit(state: &AppState, candidate: EntryCandidate, is_ai_generated: bool) -> ApiResult<Entry> {
    let entry = state.store()?.add(candidate, is_ai_generated)?;
    info!(id = %entry.id, "entry committed");
    Ok(Json(ApiResponse::ok(entry)))
}

/// PATCH /api/entries/:id - Merge a partial update
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EntryPatch>,
) -> ApiResult<Entry> {
    let entry = state.store()?.update(&id, &patch)?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// DELETE /api/entries/:id
async fn delete_entry(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Entry> {
    let removed = state.store()?.delete(&id)?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// GET /api/snapshot?view=WEEK|MONTH|YEAR&granularity=BY_MONTH|BY_WEEK&today=YYYY-MM-DD
async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<LedgerSnapshot> {
    let today = match query.today.as_deref() {
        Some(raw) => parse_ledger_date(raw)
            .ok_or_else(|| ApiError::from(LedgerError::Input(format!("invalid date: {}", raw))))?,
        None => local_today(),
    };

    let store = state.store()?;
    Ok(Json(ApiResponse::ok(snapshot(
        store.entries(),
        query.view,
        query.granularity,
        today,
    ))))
}

/// GET /api/stats - Summary scalars over the whole collection
async fn get_stats(State(state): State<AppState>) -> ApiResult<SummaryStats> {
    let store = state.store()?;
    Ok(Json(ApiResponse::ok(SummaryStats::compute(store.entries()))))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/entries", get(list_entries).post(add_from_text))
        .route("/entries/manual", post(add_manual))
        .route("/entries/audio", post(add_from_audio))
        .route("/entries/:id", patch(update_entry).delete(delete_entry))
        .route("/snapshot", get(get_snapshot))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GARLIC_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let config = LedgerConfig::load_with_dotenv()?;

    println!("🧄 Garlic Archive - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let repo = SqliteRepository::open(&config.storage.path)?;
    println!("✓ Ledger opened: {:?}", config.storage.path);

    let intake = match GeminiParser::new(&config.ai) {
        Ok(parser) => Some(Arc::new(Intake::new(parser))),
        Err(e) => {
            warn!(error = %e, "text and audio intake disabled");
            None
        }
    };

    let state = AppState {
        store: Arc::new(Mutex::new(EntryStore::open(repo))),
        intake,
    };

    let addr = config.server.addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/entries", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use garlic_archive::config::AiConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let repo = SqliteRepository::in_memory().unwrap();
        let ai = AiConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        AppState {
            store: Arc::new(Mutex::new(EntryStore::open(repo))),
            intake: Some(Arc::new(Intake::new(GeminiParser::new(&ai).unwrap()))),
        }
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn manual(amount: f64, category: &str, kind: &str) -> Value {
        json!({ "amount": amount, "category": category, "date": "2024-05-15", "type": kind })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&test_state(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_demo_text_commits_without_network() {
        let state = test_state();
        let (status, body) = call(&state, "POST", "/api/entries", Some(json!({ "text": "demo" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "Demo");
        assert_eq!(body["data"]["isAiGenerated"], true);
        assert_eq!(state.store.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let (status, body) = call(&test_state(), "POST", "/api/entries", Some(json!({ "text": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_intake_disabled_without_key() {
        let mut state = test_state();
        state.intake = None;
        let (status, _) = call(&state, "POST", "/api/entries", Some(json!({ "text": "coffee" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_manual_update_delete_cycle() {
        let state = test_state();

        let (status, body) = call(&state, "POST", "/api/entries/manual", Some(manual(40.0, "Food", "EXPENSE"))).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &state,
            "PATCH",
            &format!("/api/entries/{}", id),
            Some(json!({ "amount": 45.5, "category": "Groceries" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amount"], 45.5);
        assert_eq!(body["data"]["id"], id.as_str());

        let (status, _) = call(&state, "DELETE", &format!("/api/entries/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&state, "DELETE", &format!("/api/entries/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_filter_and_snapshot() {
        let state = test_state();
        call(&state, "POST", "/api/entries/manual", Some(manual(50.0, "Food", "EXPENSE"))).await;
        call(&state, "POST", "/api/entries/manual", Some(manual(200.0, "Salary", "INCOME"))).await;

        let (_, body) = call(&state, "GET", "/api/entries?filter=income", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = call(&state, "GET", "/api/snapshot?view=WEEK&today=2024-05-15", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cells"].as_array().unwrap().len(), 7);
        assert_eq!(body["data"]["total"], 150.0);

        let (status, _) = call(&state, "GET", "/api/snapshot?today=15/05/2024", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&state, "GET", "/api/stats", None).await;
        assert_eq!(body["data"]["entryCount"], 2);
    }
}

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use screen_core::persist::{load_model, ModelPaths};
use screen_core::{is_blank_query, DocumentInput, NormalizerConfig, Screener, ScreeningModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

pub const NO_DOCUMENTS: &str = "No resumes uploaded or pasted.";
pub const NO_QUERY: &str = "Please enter job requirements or keywords to rank resumes.";

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Largest batch accepted by `/rank`.
    pub max_documents: usize,
    pub normalizer: NormalizerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_documents: 200, normalizer: NormalizerConfig::default() }
    }
}

#[derive(Deserialize)]
pub struct RankRequest {
    pub query: String,
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
    /// Include the first N characters of each resume in the response.
    #[serde(default)]
    pub preview_chars: Option<usize>,
}

#[derive(Serialize)]
pub struct RankResponse {
    pub query: String,
    pub took_s: f64,
    pub total: usize,
    pub labeling_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub results: Vec<RankHit>,
}

#[derive(Serialize)]
pub struct RankHit {
    pub rank: usize,
    pub ordinal: String,
    pub id: String,
    pub score: f32,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryEntry {
    pub id: u32,
    pub label: String,
}

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ScreeningModel>,
    pub config: ServerConfig,
}

/// Load the model directory at startup and build the router. A missing or corrupt model
/// fails here, before the server binds.
pub fn build_app(model_dir: &str, config: ServerConfig) -> Result<Router> {
    let model = load_model(&ModelPaths::new(model_dir))?;
    Ok(router(Arc::new(model), config))
}

pub fn router(model: Arc<ScreeningModel>, config: ServerConfig) -> Router {
    let app_state = AppState { model, config };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/categories", get(categories_handler))
        .route("/rank", post(rank_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn categories_handler(State(state): State<AppState>) -> Json<Vec<CategoryEntry>> {
    let entries = state
        .model
        .categories()
        .iter()
        .map(|(id, label)| CategoryEntry { id, label: label.to_string() })
        .collect();
    Json(entries)
}

pub async fn rank_handler(
    State(state): State<AppState>,
    Json(req): Json<RankRequest>,
) -> Result<Json<RankResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    if req.documents.len() > state.config.max_documents {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("{} documents exceeds the limit of {}", req.documents.len(), state.config.max_documents),
        ));
    }

    // Empty input is not an error: answer with no results and tell the user why
    let notice = if req.documents.is_empty() {
        Some(NO_DOCUMENTS)
    } else if is_blank_query(&req.query) {
        Some(NO_QUERY)
    } else {
        None
    };
    if let Some(notice) = notice {
        return Ok(Json(RankResponse {
            query: req.query,
            took_s: start.elapsed().as_secs_f64(),
            total: 0,
            labeling_available: false,
            notice: Some(notice.to_string()),
            results: vec![],
        }));
    }

    let screening = Screener::with_config(&state.model, state.config.normalizer).screen(&req.query, req.documents);
    let preview_chars = req.preview_chars;
    let results: Vec<RankHit> = screening
        .results
        .into_iter()
        .map(|r| RankHit {
            rank: r.rank,
            ordinal: r.ordinal,
            preview: preview_chars.map(|n| r.document.raw_text.chars().take(n).collect()),
            id: r.document.id,
            score: r.score,
            category: r.category,
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::info!(docs = results.len(), labeling_available = screening.labeling_available, took_ms = elapsed.as_millis() as u64, "ranked request");
    Ok(Json(RankResponse {
        query: req.query,
        took_s: elapsed.as_secs_f64(),
        total: results.len(),
        labeling_available: screening.labeling_available,
        notice: screening.labeling_issue.map(|reason| format!("categories unavailable: {reason}")),
        results,
    }))
}

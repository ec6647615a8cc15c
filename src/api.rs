use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::ingest::types::SourceFetcher;
use crate::pipeline::Pipeline;
use crate::query::FeedQuery;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Required by `/api/autoupdate`; `None` disables that route.
    pub admin_key: Option<String>,
    pub fetchers: Arc<Vec<Arc<dyn SourceFetcher>>>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            admin_key: None,
            fetchers: Arc::new(Vec::new()),
        }
    }

    pub fn with_admin_key(mut self, key: Option<String>) -> Self {
        self.admin_key = key;
        self
    }

    pub fn with_fetchers(mut self, fetchers: Vec<Arc<dyn SourceFetcher>>) -> Self {
        self.fetchers = Arc::new(fetchers);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/update", get(update))
        .route("/api/sync", get(sync_only))
        .route("/api/autoupdate", get(auto_update))
        .route("/api/recherche_all", get(recherche_all))
        .route("/api/bovp", get(bovp))
        .route("/api/status", get(status))
        .route("/api/last_update", get(last_update))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// API router plus the static dashboard as fallback.
pub fn create_router_with_dashboard(state: AppState, public_dir: Option<PathBuf>) -> Router {
    let router = create_router(state);
    match public_dir {
        Some(dir) if dir.is_dir() => router.fallback_service(ServeDir::new(dir)),
        Some(dir) => {
            tracing::warn!(dir = %dir.display(), "dashboard directory missing; not served");
            router
        }
        None => router,
    }
}

fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "ok": false, "error": error.to_string() }))).into_response()
}

async fn update(State(state): State<AppState>) -> Response {
    tracing::info!("update requested");
    match state.pipeline.run_update().await {
        Ok(report) => Json(json!({
            "ok": true,
            "message": "Mise à jour complète réussie",
            "updated": report.summary,
            "skipped": report.skipped,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "update failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn sync_only(State(state): State<AppState>) -> Response {
    match state.pipeline.run_sync().await {
        Ok(report) => Json(json!({
            "ok": true,
            "message": "Synchronisation complète terminée",
            "log": report.log,
            "skipped": report.skipped,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "sync failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn auto_update(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let authorized = match (&state.admin_key, q.get("key")) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };
    if !authorized {
        return failure(StatusCode::UNAUTHORIZED, "Clé d'accès invalide");
    }

    tracing::info!("auto-update triggered (admin)");
    match state.pipeline.run_auto_update(&state.fetchers).await {
        Ok(result) => Json(json!({
            "ok": true,
            "message": "Mise à jour automatique terminée",
            "result": result,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "auto-update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "Erreur interne pendant la mise à jour",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn recherche_all(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Response {
    let feed = state.pipeline.fused_feed().await;
    let results = if query.is_empty() {
        feed.results
    } else {
        query.apply(feed.results, None)
    };
    Json(json!({ "ok": true, "count": results.len(), "results": results })).into_response()
}

async fn bovp(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    let results = state.pipeline.prefecture_orders(&query).await;
    Json(json!({
        "ok": true,
        "source": "BOVP PP",
        "count": results.len(),
        "results": results,
    }))
    .into_response()
}

async fn status(State(state): State<AppState>) -> Response {
    match state.pipeline.list_artifacts().await {
        Ok(files) => Json(json!({ "ok": true, "total": files.len(), "files": files })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "status listing failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn last_update(State(state): State<AppState>) -> Response {
    match state.pipeline.freshness().await {
        Some(summary) => Json(summary).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Aucune mise à jour effectuée"),
    }
}

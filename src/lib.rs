// src/lib.rs
// Public library surface for the server binary, the normalizer CLI and integration tests.

pub mod api;
pub mod error;
pub mod freshness;
pub mod fusion;
pub mod ingest;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod sources;
pub mod status;
pub mod store;
pub mod sync;
pub mod telemetry;

use std::sync::Arc;

use tracing::{info, warn};

pub use crate::api::{create_router as router, AppState};
pub use crate::error::{PipelineError, Result};
pub use crate::ingest::config::PipelineConfig;
pub use crate::pipeline::Pipeline;
pub use crate::record::CanonicalRecord;
pub use crate::store::{ArtifactStore, FsStore, MemoryStore};

/// Build the full application router from configuration on disk/env:
/// file-backed store under `data_dir`, dashboard fallback, and `/metrics`
/// when a Prometheus recorder can be installed.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = PipelineConfig::load_default()?;
    info!(
        data_dir = %cfg.data_dir.display(),
        sources = cfg.sources.len(),
        admin_key = cfg.admin_key.is_some(),
        "pipeline config loaded"
    );

    let store = Arc::new(FsStore::new(cfg.data_dir.clone()));
    let pipeline = Arc::new(Pipeline::new(store, cfg.sources));
    let state = AppState::new(pipeline).with_admin_key(cfg.admin_key);

    let mut router = api::create_router_with_dashboard(state, cfg.public_dir);
    match telemetry::Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = %e, "prometheus recorder not installed; /metrics disabled"),
    }
    Ok(router)
}

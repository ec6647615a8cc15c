//! Update cycle orchestration.
//!
//! One `Pipeline` per store. Sync and update runs are serialized by
//! `run_lock` so only one cycle (`idle → syncing → logged → idle`) touches
//! the store at a time; feed reads never take the lock.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::freshness::{self, FreshnessSummary};
use crate::fusion::{self, FusedFeed};
use crate::ingest::config::SourceSpec;
use crate::ingest::types::SourceFetcher;
use crate::query::{FeedQuery, DEFAULT_ORDERS_LIMIT};
use crate::record::CanonicalRecord;
use crate::sources::SourceKind;
use crate::status::{self, ArtifactStatus};
use crate::store::ArtifactStore;
use crate::sync::{self, SkippedArtifact, SyncReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub summary: FreshnessSummary,
    pub skipped: Vec<SkippedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub fetcher: &'static str,
    pub ok: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoUpdateReport {
    pub fetched: Vec<FetchStatus>,
    pub update: UpdateReport,
}

pub struct Pipeline {
    store: Arc<dyn ArtifactStore>,
    sources: Vec<SourceSpec>,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ArtifactStore>, sources: Vec<SourceSpec>) -> Self {
        Self {
            store,
            sources,
            run_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    /// Copy every configured artifact and write `sync_log.json`.
    pub async fn run_sync(&self) -> Result<SyncReport> {
        let _guard = self.run_lock.lock().await;
        sync::run_sync(&self.sources, self.store()).await
    }

    /// Sync, then write `last_update.json` from the fresh log.
    pub async fn run_update(&self) -> Result<UpdateReport> {
        let _guard = self.run_lock.lock().await;
        self.update_locked().await
    }

    async fn update_locked(&self) -> Result<UpdateReport> {
        let report = sync::run_sync(&self.sources, self.store()).await?;
        let summary = freshness::record(self.store(), &report.log).await?;
        Ok(UpdateReport {
            summary,
            skipped: report.skipped,
        })
    }

    /// Run each fetcher in turn, then a full update. A failing fetcher is
    /// logged and reported; its source simply keeps its previous output.
    pub async fn run_auto_update(
        &self,
        fetchers: &[Arc<dyn SourceFetcher>],
    ) -> Result<AutoUpdateReport> {
        let _guard = self.run_lock.lock().await;

        let mut fetched = Vec::with_capacity(fetchers.len());
        for f in fetchers {
            match f.fetch().await {
                Ok(outcome) => {
                    tracing::info!(
                        target: "pipeline",
                        fetcher = f.name(),
                        records = outcome.records,
                        location = %outcome.location.display(),
                        "fetch done"
                    );
                    fetched.push(FetchStatus {
                        fetcher: f.name(),
                        ok: true,
                        records: outcome.records,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(target: "pipeline", error = ?e, fetcher = f.name(), "fetcher error");
                    fetched.push(FetchStatus {
                        fetcher: f.name(),
                        ok: false,
                        records: 0,
                        error: Some(format!("{e:#}")),
                    });
                }
            }
        }

        let update = self.update_locked().await?;
        Ok(AutoUpdateReport { fetched, update })
    }

    pub async fn fused_feed(&self) -> FusedFeed {
        fusion::fuse(self.store()).await
    }

    /// Prefecture orders only, filtered; 100 records unless asked otherwise.
    pub async fn prefecture_orders(&self, query: &FeedQuery) -> Vec<CanonicalRecord> {
        let records = fusion::load_source(self.store(), SourceKind::PrefectureOrders).await;
        query.apply(records, Some(DEFAULT_ORDERS_LIMIT))
    }

    pub async fn list_artifacts(&self) -> Result<Vec<ArtifactStatus>> {
        status::list_artifacts(self.store()).await
    }

    pub async fn freshness(&self) -> Option<FreshnessSummary> {
        freshness::load(self.store()).await
    }
}

//! Freshness tracker: the "last update" summary shown by the dashboard.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::sources::LAST_UPDATE_FILE;
use crate::store::{self, ArtifactStore};
use crate::sync::SyncLog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessSummary {
    pub date: String,
    #[serde(rename = "totalFiles")]
    pub total_files: usize,
    /// One label per copied file, in sync order. Duplicates kept.
    pub sources: Vec<String>,
}

pub fn summarize(log: &SyncLog) -> FreshnessSummary {
    FreshnessSummary {
        date: log.date.clone(),
        total_files: log.files.len(),
        sources: log.files.iter().map(|f| f.source.clone()).collect(),
    }
}

/// Summarize `log` and overwrite `last_update.json` with it.
pub async fn record(store: &dyn ArtifactStore, log: &SyncLog) -> Result<FreshnessSummary> {
    let summary = summarize(log);
    store::write_json(store, LAST_UPDATE_FILE, &summary).await?;
    tracing::info!(
        target: "freshness",
        total_files = summary.total_files,
        date = %summary.date,
        "freshness summary written"
    );
    Ok(summary)
}

/// Last persisted summary. `None` means no update has completed yet (or the
/// summary cannot be read); no default is made up.
pub async fn load(store: &dyn ArtifactStore) -> Option<FreshnessSummary> {
    match store::read_json::<FreshnessSummary>(store, LAST_UPDATE_FILE).await {
        Ok(s) => Some(s),
        Err(PipelineError::NotFound(_)) => None,
        Err(e) => {
            tracing::warn!(target: "freshness", error = %e, "freshness summary unreadable");
            None
        }
    }
}

//! Sync / integrator: copy the latest fetcher outputs into the canonical
//! store and journal what was copied.
//!
//! Missing directories and files are expected while upstream fetchers have
//! not run yet; they are logged and skipped. Only a failed write to the
//! store aborts the run.

use std::io;

use chrono::Local;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::ingest::config::{ArtifactSpec, SourceSpec};
use crate::sources::SYNC_LOG_FILE;
use crate::store::{self, ArtifactStore};
use crate::telemetry::ensure_metrics_described;

/// One copied artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub source: String,
    pub file: String,
    #[serde(rename = "sizeKo")]
    pub size_ko: f64,
}

/// Journal of one sync run, persisted as `sync_log.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLog {
    pub date: String,
    pub files: Vec<SyncLogEntry>,
}

/// An input the run had to leave out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedArtifact {
    pub source: String,
    pub file: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub log: SyncLog,
    pub skipped: Vec<SkippedArtifact>,
}

/// Local wall-clock label used for `date` fields (dd/mm/yyyy HH:MM:SS).
pub fn timestamp_label() -> String {
    Local::now().format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Size in kilobytes rounded to one decimal.
pub fn size_ko(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 10.0).round() / 10.0
}

async fn read_source_file(src: &SourceSpec, file: &ArtifactSpec) -> Result<Vec<u8>> {
    let path = src.dir.join(file.name());
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PipelineError::MissingArtifactFile {
            label: src.label.clone(),
            file: file.name().to_string(),
        }),
        Err(e) => {
            // Unreadable counts as missing for this run.
            tracing::warn!(target: "sync", path = %path.display(), error = %e, "source file unreadable");
            Err(PipelineError::MissingArtifactFile {
                label: src.label.clone(),
                file: file.name().to_string(),
            })
        }
    }
}

async fn source_dir_exists(src: &SourceSpec) -> Result<()> {
    match tokio::fs::metadata(&src.dir).await {
        Ok(m) if m.is_dir() => Ok(()),
        _ => Err(PipelineError::MissingSourceDirectory {
            label: src.label.clone(),
            path: src.dir.clone(),
        }),
    }
}

fn skip(skipped: &mut Vec<SkippedArtifact>, src: &SourceSpec, file: Option<&str>, e: &PipelineError) {
    tracing::warn!(target: "sync", source = %src.label, file = ?file, "{e}");
    counter!("sync_files_skipped_total").increment(1);
    skipped.push(SkippedArtifact {
        source: src.label.clone(),
        file: file.map(str::to_string),
        reason: e.to_string(),
    });
}

/// Copy every configured artifact, source by source and file by file, then
/// overwrite `sync_log.json` with this run's journal.
pub async fn run_sync(sources: &[SourceSpec], store: &dyn ArtifactStore) -> Result<SyncReport> {
    ensure_metrics_described();
    tracing::info!(target: "sync", sources = sources.len(), "sync started");

    let mut log = SyncLog {
        date: timestamp_label(),
        files: Vec::new(),
    };
    let mut skipped = Vec::new();

    for src in sources {
        if let Err(e) = source_dir_exists(src).await {
            skip(&mut skipped, src, None, &e);
            continue;
        }

        for file in &src.files {
            let bytes = match read_source_file(src, file).await {
                Ok(b) => b,
                Err(e) if e.is_recoverable() => {
                    skip(&mut skipped, src, Some(file.name()), &e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let stored = file.stored_name();
            store.write(stored, &bytes).await?;

            let entry = SyncLogEntry {
                source: src.label.clone(),
                file: stored.to_string(),
                size_ko: size_ko(bytes.len() as u64),
            };
            tracing::info!(
                target: "sync",
                source = %entry.source,
                file = %entry.file,
                size_ko = entry.size_ko,
                "artifact copied"
            );
            counter!("sync_files_copied_total").increment(1);
            log.files.push(entry);
        }
    }

    store::write_json(store, SYNC_LOG_FILE, &log).await?;
    counter!("sync_runs_total").increment(1);
    tracing::info!(
        target: "sync",
        copied = log.files.len(),
        skipped = skipped.len(),
        "sync log written"
    );

    Ok(SyncReport { log, skipped })
}

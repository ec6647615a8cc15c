//! Canonical artifact store.
//!
//! Sync, the Normalizer, fusion and the freshness tracker never touch a data
//! directory directly: they go through an [`ArtifactStore`] handed to them by
//! the caller. `FsStore` backs the running service; `MemoryStore` backs tests.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{PipelineError, Result};

/// Metadata of one stored artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactMeta {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Returns `PipelineError::NotFound` when the artifact is absent or unreadable.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Overwrites `name`. Readers observe either the old or the new content.
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    async fn list(&self) -> Result<Vec<ArtifactMeta>>;
}

/// Plain file name: no separators, no parent references.
pub(crate) fn is_flat_name(name: &str) -> bool {
    !name.is_empty() && name != "." && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Artifact names are flat file names inside the store.
fn check_name(name: &str) -> Result<()> {
    if !is_flat_name(name) {
        return Err(PipelineError::InvalidArtifactName(name.to_string()));
    }
    Ok(())
}

pub async fn read_json<T: DeserializeOwned>(store: &dyn ArtifactStore, name: &str) -> Result<T> {
    let bytes = store.read(name).await?;
    serde_json::from_slice(&bytes).map_err(|source| PipelineError::MalformedArtifact {
        name: name.to_string(),
        source,
    })
}

pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn ArtifactStore,
    name: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| PipelineError::PersistenceFailure {
        name: name.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;
    store.write(name, &bytes).await
}

// ---------------------------------------------------------------------------
// Directory-backed store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

fn persistence(name: &str) -> impl FnOnce(io::Error) -> PipelineError + '_ {
    move |source| PipelineError::PersistenceFailure {
        name: name.to_string(),
        source,
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(name.to_string()))
            }
            Err(e) => {
                tracing::warn!(artifact = name, error = %e, "artifact unreadable");
                Err(PipelineError::NotFound(name.to_string()))
            }
        }
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_of(name)?;
        let root = self.root.clone();
        let data = data.to_vec();

        // Each write gets its own temp file in the target directory, then
        // renames over the target.
        let res = tokio::task::spawn_blocking(move || -> io::Result<()> {
            std::fs::create_dir_all(&root)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&data)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .unwrap_or_else(|join| Err(io::Error::new(io::ErrorKind::Other, join)));
        res.map_err(persistence(name))
    }

    async fn list(&self) -> Result<Vec<ArtifactMeta>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence(".")(e)),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(persistence("."))? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = meta
                .modified()
                .map(DateTime::<Local>::from)
                .unwrap_or_else(|_| Local::now());
            out.push(ArtifactMeta {
                name,
                size_bytes: meta.len(),
                modified,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Local>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files().contains_key(name)
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, (Vec<u8>, DateTime<Local>)>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        check_name(name)?;
        let files = self.files();
        files
            .get(name)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        check_name(name)?;
        let mut files = self.files();
        files.insert(name.to_string(), (data.to_vec(), Local::now()));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ArtifactMeta>> {
        let files = self.files();
        Ok(files
            .iter()
            .map(|(name, (bytes, modified))| ArtifactMeta {
                name: name.clone(),
                size_bytes: bytes.len() as u64,
                modified: *modified,
            })
            .collect())
    }
}

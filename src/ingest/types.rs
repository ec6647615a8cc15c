// src/ingest/types.rs
use anyhow::Result;
use std::path::PathBuf;

/// What a fetcher reports after dropping its raw artifact on disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FetchOutcome {
    pub records: usize,    // records written
    pub location: PathBuf, // artifact path
}

/// Raw-page retrieval for one origin (BOVP, ParisData…). Implementations
/// live outside this crate; the pipeline only sequences them.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self) -> Result<FetchOutcome>;
    fn name(&self) -> &'static str;
}

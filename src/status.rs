//! Listing of what currently sits in the canonical store.

use serde::Serialize;

use crate::error::Result;
use crate::sources::listing_label;
use crate::store::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub file: String,
    pub source: &'static str,
    #[serde(rename = "sizeKo")]
    pub size_ko: u64,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Every stored artifact sorted by file name, sizes rounded to whole Ko.
pub async fn list_artifacts(store: &dyn ArtifactStore) -> Result<Vec<ArtifactStatus>> {
    let mut out: Vec<ArtifactStatus> = store
        .list()
        .await?
        .into_iter()
        .map(|m| ArtifactStatus {
            source: listing_label(&m.name),
            size_ko: (m.size_bytes as f64 / 1024.0).round() as u64,
            updated_at: m.modified.format("%d/%m/%Y %H:%M:%S").to_string(),
            file: m.name,
        })
        .collect();
    out.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn lists_sorted_with_inferred_labels() {
        let store = MemoryStore::new();
        store.write("sync_log.json", b"{}").await.unwrap();
        store.write("paris_travaux_clean.json", &vec![b' '; 3000]).await.unwrap();
        store.write("bovp_ville.json", b"[]").await.unwrap();

        let list = list_artifacts(&store).await.unwrap();
        let names: Vec<_> = list.iter().map(|a| a.file.as_str()).collect();
        assert_eq!(
            names,
            vec!["bovp_ville.json", "paris_travaux_clean.json", "sync_log.json"]
        );
        assert_eq!(list[0].source, "BOVP");
        assert_eq!(list[1].source, "Paris Data");
        assert_eq!(list[1].size_ko, 3);
        assert_eq!(list[2].source, "Other");
    }
}

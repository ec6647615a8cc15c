//! Feed filters behind the `/api/recherche_all` and `/api/bovp` query strings.

use serde::Deserialize;

use crate::record::CanonicalRecord;

pub const DEFAULT_ORDERS_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Keyword over titre and adresse.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Substring of `date_publication` (falls back to `date`).
    #[serde(default)]
    pub date: Option<String>,
    /// Substring of the fused source label, e.g. "Préfecture".
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn lowered(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

impl FeedQuery {
    pub fn is_empty(&self) -> bool {
        lowered(&self.q).is_none()
            && lowered(&self.kind).is_none()
            && lowered(&self.date).is_none()
            && lowered(&self.source).is_none()
            && self.limit.is_none()
    }

    pub fn matches(&self, r: &CanonicalRecord) -> bool {
        if let Some(q) = lowered(&self.q) {
            let hit = contains_ci(&r.titre, &q)
                || r.adresse.as_deref().is_some_and(|a| contains_ci(a, &q));
            if !hit {
                return false;
            }
        }
        if let Some(t) = lowered(&self.kind) {
            if !r.kind.as_deref().is_some_and(|k| contains_ci(k, &t)) {
                return false;
            }
        }
        if let Some(d) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let published = r.date_publication.as_deref().or(r.date.as_deref());
            if !published.is_some_and(|p| p.contains(d)) {
                return false;
            }
        }
        if let Some(s) = lowered(&self.source) {
            if !contains_ci(&r.source, &s) {
                return false;
            }
        }
        true
    }

    /// Keep matching records in order, up to `limit` (or `default_limit`).
    pub fn apply(
        &self,
        records: Vec<CanonicalRecord>,
        default_limit: Option<usize>,
    ) -> Vec<CanonicalRecord> {
        let limit = self.limit.or(default_limit).unwrap_or(usize::MAX);
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .take(limit)
            .collect()
    }
}

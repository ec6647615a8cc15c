// src/ingest/mod.rs
//! Normalizer: raw per-source dumps in, canonical records out.

pub mod config;
pub mod mapping;
pub mod types;

use crate::error::{PipelineError, Result};
use crate::ingest::mapping::{FieldRule, FieldSource};
use crate::telemetry::ensure_metrics_described;
use crate::record::CanonicalRecord;
use crate::sources::SourceKind;
use crate::store::{self, ArtifactStore};
use metrics::counter;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

/// Clean one raw text value: decode HTML entities, fold NBSP and runs of
/// whitespace into single spaces, trim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Text form of a raw scalar. Objects, arrays and nulls count as absent.
fn scalar_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn first_present(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| raw.get(*k).and_then(scalar_text))
}

fn resolve(rule: &FieldRule, raw: &Map<String, Value>) -> Option<String> {
    let value = match rule.from {
        FieldSource::Keys(keys) => first_present(raw, keys),
        FieldSource::Constant(c) => Some(c.to_string()),
        FieldSource::Pair {
            left,
            right,
            missing,
        } => {
            let l = first_present(raw, left);
            let r = first_present(raw, right);
            Some(format!(
                "{} x {}",
                l.as_deref().unwrap_or(missing),
                r.as_deref().unwrap_or(missing)
            ))
        }
    };
    value.or_else(|| rule.fallback.map(str::to_string))
}

/// Apply one field table to one raw record.
pub fn normalize_record(table: &[FieldRule], raw: &Map<String, Value>) -> CanonicalRecord {
    let mut rec = CanonicalRecord::new(crate::record::UNTITLED);
    for rule in table {
        if let Some(v) = resolve(rule, raw) {
            rec.set(rule.target, v);
        }
    }
    rec
}

/// Records carried by a raw artifact. Accepts a bare array or the open-data
/// envelope `{ "results": [...] }`; `None` for anything else.
fn raw_items(raw: &Value) -> Option<&Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get("results").and_then(Value::as_array),
        _ => None,
    }
}

/// Normalize a raw artifact. Absent (`None`/`null`) or unrecognised input
/// yields an empty sequence. Every raw item yields exactly one record.
pub fn normalize(table: &[FieldRule], raw: Option<&Value>) -> Vec<CanonicalRecord> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Vec::new();
    };
    let Some(items) = raw_items(raw) else {
        tracing::warn!(target: "ingest", "raw artifact has no record array");
        return Vec::new();
    };

    let empty = Map::new();
    items
        .iter()
        .map(|item| normalize_record(table, item.as_object().unwrap_or(&empty)))
        .collect()
}

/// Read and normalize one raw artifact from the store. Never fails: missing
/// or unparsable input is logged and produces no records.
pub async fn normalize_artifact(
    store: &dyn ArtifactStore,
    raw_name: &str,
    table: &[FieldRule],
) -> Vec<CanonicalRecord> {
    ensure_metrics_described();

    let raw: Value = match store::read_json(store, raw_name).await {
        Ok(v) => v,
        Err(PipelineError::NotFound(_)) => {
            tracing::warn!(target: "ingest", artifact = raw_name, "raw artifact missing");
            return Vec::new();
        }
        Err(e) => {
            tracing::error!(target: "ingest", artifact = raw_name, error = %e, "raw artifact unreadable");
            counter!("artifact_malformed_total").increment(1);
            return Vec::new();
        }
    };

    let out = normalize(table, Some(&raw));
    counter!("normalize_records_total").increment(out.len() as u64);
    out
}

/// Count of canonical records written per file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NormalizedFile {
    pub file: &'static str,
    pub count: usize,
}

/// Rebuild the canonical files of every kind that has a raw dump
/// (public works, terraces). Only a failed write is an error.
pub async fn normalize_paris_data(store: &dyn ArtifactStore) -> Result<Vec<NormalizedFile>> {
    let mut written = Vec::new();
    for kind in SourceKind::ALL {
        let Some((raw_name, table)) = kind.raw_input() else {
            continue;
        };
        let records = normalize_artifact(store, raw_name, table).await;
        store::write_json(store, kind.canonical_file(), &records).await?;
        tracing::info!(
            target: "ingest",
            file = kind.canonical_file(),
            count = records.len(),
            "canonical file written"
        );
        written.push(NormalizedFile {
            file: kind.canonical_file(),
            count: records.len(),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::mapping::{ADDRESS_PLACEHOLDER, PUBLIC_WORKS_FIELDS, TERRACES_FIELDS};
    use serde_json::json;

    #[test]
    fn clean_text_decodes_and_folds_whitespace() {
        assert_eq!(clean_text("  Rue&nbsp;de \n\t Rivoli  "), "Rue de Rivoli");
        assert_eq!(clean_text("Caf&eacute; &amp; Co"), "Café & Co");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn null_and_unknown_shapes_give_nothing() {
        assert!(normalize(PUBLIC_WORKS_FIELDS, None).is_empty());
        assert!(normalize(PUBLIC_WORKS_FIELDS, Some(&Value::Null)).is_empty());
        assert!(normalize(PUBLIC_WORKS_FIELDS, Some(&json!({ "total_count": 0 }))).is_empty());
        assert!(normalize(PUBLIC_WORKS_FIELDS, Some(&json!("text"))).is_empty());
    }

    #[test]
    fn priority_order_picks_first_non_empty_key() {
        let raw = json!([{ "Voie(s)": "   ", "voie": "Quai de la Seine" }]);
        let out = normalize(PUBLIC_WORKS_FIELDS, Some(&raw));
        assert_eq!(out[0].adresse.as_deref(), Some("Quai de la Seine"));
    }

    #[test]
    fn non_object_items_keep_their_slot() {
        let raw = json!({ "results": [42, { "objet": "Pose de canalisations" }] });
        let out = normalize(PUBLIC_WORKS_FIELDS, Some(&raw));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].titre, "Travaux");
        assert_eq!(out[0].adresse.as_deref(), Some(ADDRESS_PLACEHOLDER));
        assert_eq!(out[1].titre, "Pose de canalisations");
    }

    #[test]
    fn terrace_surface_and_numbers() {
        let raw = json!([{ "Longueur": 4.5, "Arrondissement": 75011 }]);
        let out = normalize(TERRACES_FIELDS, Some(&raw));
        assert_eq!(out[0].extra_str("surface"), Some("4.5 x ?"));
        assert_eq!(out[0].extra_str("arrondissement"), Some("75011"));
        assert_eq!(out[0].extra_str("statut"), Some("Autorisé"));
    }
}

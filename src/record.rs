//! Canonical record shape shared by every feed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNTITLED: &str = "Sans titre";

fn untitled() -> String {
    UNTITLED.to_string()
}

/// Canonical core plus open extension: anything outside the core fields
/// travels through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default)]
    pub source: String,
    #[serde(default = "untitled")]
    pub titre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_publication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periode: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalRecord {
    pub fn new(titre: impl Into<String>) -> Self {
        Self {
            source: String::new(),
            titre: titre.into(),
            adresse: None,
            date: None,
            date_publication: None,
            periode: None,
            kind: None,
            extra: Map::new(),
        }
    }

    /// Sets a field by its wire name; unknown names land in `extra`.
    pub fn set(&mut self, field: &str, value: String) {
        match field {
            "source" => self.source = value,
            "titre" => self.titre = value,
            "adresse" => self.adresse = Some(value),
            "date" => self.date = Some(value),
            "date_publication" => self.date_publication = Some(value),
            "periode" => self.periode = Some(value),
            "type" => self.kind = Some(value),
            other => {
                self.extra.insert(other.to_string(), Value::String(value));
            }
        }
    }

    /// Lenient conversion of one stored element. Scalars in core fields are
    /// stringified, nulls count as absent, nested values in core fields move
    /// to `extra`. A non-object element becomes an untitled record.
    pub fn from_value(value: Value) -> Self {
        let mut rec = Self::new(UNTITLED);
        let Value::Object(obj) = value else {
            return rec;
        };
        for (key, v) in obj {
            let core = matches!(
                key.as_str(),
                "source" | "titre" | "adresse" | "date" | "date_publication" | "periode" | "type"
            );
            if !core {
                rec.extra.insert(key, v);
                continue;
            }
            match v {
                Value::Null => {}
                Value::String(s) => rec.set(&key, s),
                Value::Number(n) => rec.set(&key, n.to_string()),
                Value::Bool(b) => rec.set(&key, b.to_string()),
                // `titre` is always serialized, so a nested title cannot also live in `extra`.
                nested if key != "titre" && key != "source" => {
                    rec.extra.insert(key, nested);
                }
                _ => {}
            }
        }
        rec
    }

    /// Looks up an extension attribute as text.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_title_falls_back_to_placeholder() {
        let r: CanonicalRecord = serde_json::from_value(json!({ "lien": "https://x" })).unwrap();
        assert_eq!(r.titre, UNTITLED);
        assert_eq!(r.source, "");
        assert_eq!(r.extra_str("lien"), Some("https://x"));
    }

    #[test]
    fn loose_values_are_coerced_not_rejected() {
        let r = CanonicalRecord::from_value(json!({
            "titre": null,
            "date": 20251112,
            "adresse": { "voie": "Rue de Rivoli" },
            "urgent": true
        }));
        assert_eq!(r.titre, UNTITLED);
        assert_eq!(r.date.as_deref(), Some("20251112"));
        assert!(r.adresse.is_none());
        assert_eq!(r.extra["adresse"]["voie"], "Rue de Rivoli");
        assert_eq!(r.extra["urgent"], true);

        let placeholder = CanonicalRecord::from_value(json!("stray"));
        assert_eq!(placeholder, CanonicalRecord::new(UNTITLED));
    }

    #[test]
    fn type_and_extras_keep_their_wire_names() {
        let mut r = CanonicalRecord::new("Travaux rue de Rivoli");
        r.set("type", "Travaux perturbants".into());
        r.set("impact", "Circulation réduite".into());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["type"], "Travaux perturbants");
        assert_eq!(v["impact"], "Circulation réduite");
        assert!(v.get("adresse").is_none());
        assert!(v.get("kind").is_none());
    }
}

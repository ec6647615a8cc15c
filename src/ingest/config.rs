// src/ingest/config.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::store::is_flat_name;

pub const ENV_CONFIG_PATH: &str = "LEXPAR_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "LEXPAR_DATA_DIR";
pub const ENV_ADMIN_KEY: &str = "LEXPAR_ADMIN_KEY";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

/// One file expected in a source directory, optionally stored under
/// another canonical name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArtifactSpec {
    Plain(String),
    Renamed { name: String, store_as: String },
}

impl ArtifactSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(n) | Self::Renamed { name: n, .. } => n,
        }
    }

    pub fn stored_name(&self) -> &str {
        match self {
            Self::Plain(n) => n,
            Self::Renamed { store_as, .. } => store_as,
        }
    }
}

/// A fetcher output directory and the artifacts sync picks up from it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    pub label: String,
    pub dir: PathBuf,
    pub files: Vec<ArtifactSpec>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Static dashboard served as router fallback.
    #[serde(default)]
    pub public_dir: Option<PathBuf>,
    /// "ENV" means: read from LEXPAR_ADMIN_KEY.
    #[serde(default)]
    pub admin_key: Option<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            public_dir: None,
            admin_key: None,
            sources: default_sources(),
        }
    }
}

/// Fetcher projects checked out next to this one.
pub fn default_sources() -> Vec<SourceSpec> {
    let plain = |n: &str| ArtifactSpec::Plain(n.to_string());
    vec![
        SourceSpec {
            label: "ParisData".into(),
            dir: PathBuf::from("../LexPar_API_ParisData/data"),
            files: vec![
                plain("paris_terrasses_clean.json"),
                plain("paris_travaux_clean.json"),
                plain("parisdata_clean.json"),
                plain("parisdata_full.json"),
            ],
        },
        SourceSpec {
            label: "BOVP_PP".into(),
            dir: PathBuf::from("../LexPar_BOVP_Extraction/data"),
            files: vec![ArtifactSpec::Renamed {
                name: "arretes_cache.json".into(),
                store_as: "bovp_prefecture.json".into(),
            }],
        },
        SourceSpec {
            label: "BOVP_VILLE".into(),
            dir: PathBuf::from("../LexPar_BOVP_Ville_V1/data"),
            files: vec![ArtifactSpec::Renamed {
                name: "arretes_ville_cache.json".into(),
                store_as: "bovp_ville.json".into(),
            }],
        },
    ]
}

impl PipelineConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading {}: {e}", path.display()))
        })?;
        let cfg: PipelineConfig = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("parsing {}: {e}", path.display()))
        })?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $LEXPAR_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(PipelineError::Config(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                )));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }

        // Resolve admin key if "ENV"
        if let Some(key) = self.admin_key.take() {
            let key = key.trim().to_string();
            self.admin_key = if key.eq_ignore_ascii_case("env") {
                let k = std::env::var(ENV_ADMIN_KEY)
                    .map_err(|_| PipelineError::Config(format!("missing {ENV_ADMIN_KEY} env var")))?;
                Some(k)
            } else if key.is_empty() {
                None
            } else {
                Some(key)
            };
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for src in &self.sources {
            if src.label.trim().is_empty() {
                return Err(PipelineError::Config(
                    "source with empty label in pipeline config".into(),
                ));
            }
            for f in &src.files {
                for name in [f.name(), f.stored_name()] {
                    if !is_flat_name(name) {
                        return Err(PipelineError::Config(format!(
                            "[{}] invalid artifact name {name:?}",
                            src.label
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_renamed_files_parse() {
        let toml = r#"
data_dir = "/srv/lexpar/data"

[[sources]]
label = "City"
dir = "/srv/ville/data"
files = ["bovp_ville.json", { name = "arretes_ville_cache.json", store_as = "bovp_ville_v1.json" }]
"#;
        let cfg: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/lexpar/data"));
        let files = &cfg.sources[0].files;
        assert_eq!(files[0].stored_name(), "bovp_ville.json");
        assert_eq!(files[1].name(), "arretes_ville_cache.json");
        assert_eq!(files[1].stored_name(), "bovp_ville_v1.json");
    }

    #[test]
    fn defaults_feed_the_merger_file_names() {
        let cfg = PipelineConfig::default();
        let stored: Vec<_> = cfg
            .sources
            .iter()
            .flat_map(|s| s.files.iter().map(|f| f.stored_name().to_string()))
            .collect();
        for needed in [
            "bovp_prefecture.json",
            "bovp_ville.json",
            "paris_travaux_clean.json",
            "paris_terrasses_clean.json",
        ] {
            assert!(stored.iter().any(|s| s == needed), "{needed}");
        }
    }

    #[test]
    fn stored_names_must_be_flat() {
        let cfg = PipelineConfig {
            sources: vec![SourceSpec {
                label: "X".into(),
                dir: PathBuf::from("/tmp"),
                files: vec![ArtifactSpec::Renamed {
                    name: "a.json".into(),
                    store_as: "../a.json".into(),
                }],
            }],
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn upstream_names_must_stay_inside_the_source_dir() {
        let cfg = PipelineConfig {
            sources: vec![SourceSpec {
                label: "BOVP_PP".into(),
                dir: PathBuf::from("/srv/bovp/data"),
                files: vec![ArtifactSpec::Renamed {
                    name: "../../etc/passwd".into(),
                    store_as: "bovp_prefecture.json".into(),
                }],
            }],
            ..PipelineConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("../../etc/passwd"), "{err}");
    }
}

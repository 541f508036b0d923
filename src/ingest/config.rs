// src/ingest/config.rs
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::read_structured;
use crate::error::ConfigError;
use crate::ingest::sources::{builtin_sources, SourceSpec};
use crate::ingest::types::SourceId;

const ENV_PATH: &str = "SOURCES_CONFIG_PATH";

/// Shape of an override file:
///
/// ```toml
/// [sources.cts]
/// url = "https://www.cts.tv/program/list"
/// selectors = ["ul.list li strong", "div.program-list-box li a strong"]
/// ```
#[derive(Debug, Default, Deserialize)]
struct OverrideFile {
    #[serde(default)]
    sources: BTreeMap<String, SourceOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceOverride {
    url: Option<String>,
    selectors: Option<Vec<String>>,
}

/// Built-in table with overrides from an explicit path applied.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceSpec>, ConfigError> {
    let file: OverrideFile = read_structured(path)?;
    apply_overrides(builtin_sources(), file, path)
}

/// Source table using env var + fallbacks:
/// 1) $SOURCES_CONFIG_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in table unchanged
pub fn load_sources_default() -> Result<Vec<SourceSpec>, ConfigError> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(ConfigError::MissingPath {
                env: ENV_PATH,
                path: pb,
            });
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(builtin_sources())
}

fn apply_overrides(
    mut specs: Vec<SourceSpec>,
    file: OverrideFile,
    path: &Path,
) -> Result<Vec<SourceSpec>, ConfigError> {
    for (key, ov) in file.sources {
        let id: SourceId = key.parse().map_err(|source| ConfigError::UnknownSource {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(spec) = specs.iter_mut().find(|s| s.source == id) else {
            continue;
        };
        if let Some(url) = ov.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            spec.url = url;
        }
        if let Some(selectors) = ov.selectors {
            let cleaned = clean_list(selectors);
            if cleaned.is_empty() {
                return Err(ConfigError::EmptySelectors {
                    path: path.to_path_buf(),
                    key,
                });
            }
            spec.selectors = cleaned;
        }
    }
    Ok(specs)
}

/// Trim, drop blanks, drop repeats; order is significant so keep it.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}

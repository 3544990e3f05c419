//! Configuration system for citeharvest.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> CLI overrides. The user file lives
//! at `~/.config/citeharvest/config.toml`, the workspace file at
//! `<workspace>/citeharvest.toml` unless an explicit path is given.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::InputIdentifier;

/// File name of the workspace-level configuration.
pub const WORKSPACE_CONFIG_FILE: &str = "citeharvest.toml";

/// Prefix for environment overrides (`CITEHARVEST_SEARCH__API_KEY`, ...).
pub const ENV_PREFIX: &str = "CITEHARVEST_";

/// Top-level configuration for a harvest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub metadata: MetadataConfig,
    pub search: SearchConfig,
    pub pacing: PacingConfig,
    pub run: RunConfig,
}

/// Bibliographic metadata service (Crossref) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Base URL; the identifier is appended as a path segment.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Contact address sent as `mailto`, which routes requests to Crossref's polite pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.crossref.org/works".to_string(),
            timeout_secs: 10,
            user_agent: format!("citeharvest/{}", env!("CARGO_PKG_VERSION")),
            mailto: None,
        }
    }
}

/// Citation search index (SerpApi Google Scholar) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    /// SerpApi credential. Never embedded; supply via config file or environment.
    #[serde(default, deserialize_with = "string_or_number")]
    pub api_key: String,
    pub engine: String,
    /// Interface language (`hl`).
    pub language: String,
    /// Result type filter (`as_sdt`) used when paging citing works.
    pub as_sdt: String,
    pub timeout_secs: u64,
    /// Maximum citing records kept per identifier. Zero or absent means no cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".to_string(),
            api_key: String::new(),
            engine: "google_scholar".to_string(),
            language: "en".to_string(),
            as_sdt: "0,5".to_string(),
            timeout_secs: 30,
            max_results: None,
        }
    }
}

impl SearchConfig {
    /// The per-identifier cap, with zero treated as "no cap".
    pub fn effective_max_results(&self) -> Option<usize> {
        self.max_results.filter(|&n| n > 0)
    }
}

/// Fixed politeness pauses between upstream requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between two pages of the same cited-by listing.
    pub page_delay_ms: u64,
    /// Pause between two identifiers.
    pub identifier_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 2_000,
            identifier_delay_ms: 3_000,
        }
    }
}

impl PacingConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn identifier_delay(&self) -> Duration {
        Duration::from_millis(self.identifier_delay_ms)
    }
}

/// Inputs and outputs of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub identifiers: Vec<String>,
    /// File with one identifier per line; `#` starts a comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers_file: Option<PathBuf>,
    pub output: PathBuf,
    /// Where to write the JSON run summary, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            identifiers: Vec::new(),
            identifiers_file: None,
            output: PathBuf::from("cited_by_results.csv"),
            summary: None,
        }
    }
}

impl HarvestConfig {
    /// Collect the identifiers to process: the inline list first, then the
    /// entries of `identifiers_file` (resolved against `base` when relative).
    pub fn identifiers(&self, base: &Path) -> Result<Vec<InputIdentifier>, ConfigError> {
        let mut ids: Vec<InputIdentifier> = self
            .run
            .identifiers
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(InputIdentifier::from)
            .collect();

        if let Some(file) = &self.run.identifiers_file {
            let path = resolve_path(base, file);
            let text = std::fs::read_to_string(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConfigError::FileNotFound { path: path.clone() }
                } else {
                    ConfigError::Invalid {
                        message: format!("cannot read {}: {}", path.display(), e),
                    }
                }
            })?;
            ids.extend(parse_identifier_list(&text));
        }

        Ok(ids)
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self, base: &Path) -> Result<Vec<InputIdentifier>, ConfigError> {
        if self.search.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "search.api_key".into(),
            });
        }
        if self.metadata.timeout_secs == 0 || self.search.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "request timeouts must be at least one second".into(),
            });
        }
        let ids = self.identifiers(base)?;
        if ids.is_empty() {
            return Err(ConfigError::Invalid {
                message: "no identifiers configured (run.identifiers or run.identifiers_file)"
                    .into(),
            });
        }
        Ok(ids)
    }

    /// A copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.search.api_key.is_empty() {
            copy.search.api_key = "********".to_string();
        }
        copy
    }
}

/// Parse an identifier list: one per line, blank lines and `#` comments skipped.
pub fn parse_identifier_list(text: &str) -> Vec<InputIdentifier> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(InputIdentifier::from)
        .collect()
}

/// Environment values are type-guessed, so an all-digit key arrives as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "citeharvest", "citeharvest")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `CITEHARVEST_`, `__` separates sections)
/// 2. The explicit config file, or else the workspace `citeharvest.toml`
/// 3. User config (`~/.config/citeharvest/config.toml`)
/// 4. Built-in defaults
///
/// CLI flags are applied by the caller on the returned value.
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<HarvestConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(HarvestConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    } else if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

/// Check whether a workspace or user configuration file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(path) = user_config_path()
        && path.exists()
    {
        return true;
    }
    workspace.is_some_and(|ws| ws.join(WORKSPACE_CONFIG_FILE).exists())
}

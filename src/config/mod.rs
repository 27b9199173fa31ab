//! Configuration loaded from `~/.prody/config.json` plus environment
//! overrides.

pub mod toggles;
pub mod watcher;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::error::{ProdyError, Result};
use crate::orchestrator::DEFAULT_MAX_RETRIES;
use crate::providers::gemini::DEFAULT_GEMINI_MODEL;
use crate::providers::openrouter::DEFAULT_OPENROUTER_MODEL;
use crate::providers::rate_limit::{DEFAULT_MAX_PER_DAY, DEFAULT_MAX_PER_HOUR};

pub use toggles::{StaticToggles, ToggleSource, WatchedToggles};
pub use watcher::{ConfigWatchHandle, ConfigWatcher};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub stats: StatsConfig,
    pub rate_limit: RateLimitConfig,
    pub orchestrator: OrchestratorConfig,
    pub providers: ProvidersConfig,
    pub features: FeatureToggles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry cap before a batch eviction.
    pub max_entries: usize,
    /// Snapshot location. Defaults to `~/.prody/cache/ai_responses.json`.
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Snapshot location. Defaults to `~/.prody/stats/ai_usage.json`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_per_hour: u32,
    pub max_per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_hour: DEFAULT_MAX_PER_HOUR,
            max_per_day: DEFAULT_MAX_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Rounds across both providers before giving up.
    pub max_retries: u32,
    /// Replaces the built-in persona prompt when set.
    pub persona_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            persona_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
    pub openrouter: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: ProviderConfig::with_model(DEFAULT_GEMINI_MODEL),
            openrouter: ProviderConfig::with_model(DEFAULT_OPENROUTER_MODEL),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    fn with_model(model: &str) -> Self {
        Self {
            api_key: None,
            model: model.to_string(),
        }
    }
}

/// Master switch plus one toggle per feature. Everything is on by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub ai_enabled: bool,
    pub journal_insights: bool,
    pub daily_wisdom: bool,
    pub quote_explanations: bool,
    pub vocabulary_help: bool,
    pub weekly_patterns: bool,
    pub message_helper: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            journal_insights: true,
            daily_wisdom: true,
            quote_explanations: true,
            vocabulary_help: true,
            weekly_patterns: true,
            message_helper: true,
        }
    }
}

impl FeatureToggles {
    /// Everything off.
    pub fn disabled() -> Self {
        Self {
            ai_enabled: false,
            journal_insights: false,
            daily_wisdom: false,
            quote_explanations: false,
            vocabulary_help: false,
            weekly_patterns: false,
            message_helper: false,
        }
    }
}

impl Config {
    /// `~/.prody`
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".prody")
    }

    /// `~/.prody/config.json`
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default path and apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file. A missing file yields the defaults;
    /// environment overrides are not applied.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                ProdyError::Config(format!("invalid config at {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Config::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|&k| lookup(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        if let Some(key) = first(&["PRODY_GEMINI_API_KEY", "GEMINI_API_KEY"]) {
            self.providers.gemini.api_key = Some(key);
        }
        if let Some(key) = first(&["PRODY_OPENROUTER_API_KEY", "OPENROUTER_API_KEY"]) {
            self.providers.openrouter.api_key = Some(key);
        }
        if let Some(raw) = first(&["PRODY_AI_ENABLED"]) {
            match parse_bool(&raw) {
                Some(enabled) => self.features.ai_enabled = enabled,
                None => tracing::warn!(value = %raw, "Ignoring unrecognised PRODY_AI_ENABLED"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(ProdyError::Config("cache.max_entries must be > 0".into()));
        }
        if self.rate_limit.max_per_hour == 0 || self.rate_limit.max_per_day == 0 {
            return Err(ProdyError::Config(
                "rate_limit.max_per_hour and rate_limit.max_per_day must be > 0".into(),
            ));
        }
        if self.orchestrator.max_retries == 0 {
            return Err(ProdyError::Config(
                "orchestrator.max_retries must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .unwrap_or_else(|| Self::dir().join("cache").join("ai_responses.json"))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.stats
            .path
            .clone()
            .unwrap_or_else(|| Self::dir().join("stats").join("ai_usage.json"))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.cache.max_entries, 500);
        assert_eq!(cfg.rate_limit.max_per_hour, 20);
        assert_eq!(cfg.rate_limit.max_per_day, 100);
        assert_eq!(cfg.orchestrator.max_retries, 2);
        assert_eq!(cfg.providers.gemini.model, DEFAULT_GEMINI_MODEL);
        assert!(cfg.features.ai_enabled);
        assert!(cfg.features.message_helper);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"rate_limit": {"max_per_hour": 5}, "features": {"weekly_patterns": false}}"#,
        )
        .unwrap();
        let cfg = Config::load_from_path(&path).unwrap();
        assert_eq!(cfg.rate_limit.max_per_hour, 5);
        assert_eq!(cfg.rate_limit.max_per_day, 100);
        assert!(!cfg.features.weekly_patterns);
        assert!(cfg.features.journal_insights);
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load_from_path(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ProdyError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut cfg = Config::default();
        cfg.rate_limit.max_per_day = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.orchestrator.max_retries = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.cache.max_entries = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_env_overrides_prefer_prefixed_names() {
        let vars: HashMap<&str, &str> = [
            ("PRODY_GEMINI_API_KEY", "prody-key"),
            ("GEMINI_API_KEY", "plain-key"),
            ("OPENROUTER_API_KEY", "or-key"),
            ("PRODY_AI_ENABLED", "off"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.providers.gemini.api_key.as_deref(), Some("prody-key"));
        assert_eq!(cfg.providers.openrouter.api_key.as_deref(), Some("or-key"));
        assert!(!cfg.features.ai_enabled);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.providers.gemini.api_key = Some("from-file".into());
        cfg.apply_overrides_from(|k| (k == "PRODY_GEMINI_API_KEY").then(|| "  ".to_string()));
        assert_eq!(cfg.providers.gemini.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_default_snapshot_paths() {
        let cfg = Config::default();
        assert!(cfg.cache_path().ends_with(".prody/cache/ai_responses.json"));
        assert!(cfg.stats_path().ends_with(".prody/stats/ai_usage.json"));
    }
}

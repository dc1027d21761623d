use crate::ai_provider::AiProvider;
use crate::error::{BoqError, Result};
use boq_tagger_common::FALLBACK_TAG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PROVIDER_ENV: &str = "BOQ_TAGGER_PROVIDER";
pub const MODEL_ENV: &str = "BOQ_TAGGER_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: AiProvider,
    pub model: Option<String>,
    pub timeout_seconds: u64,
    /// Oracle calls in flight at once
    pub max_concurrency: usize,
    /// Attempts per oracle call, including the first
    #[serde(alias = "max_retries")]
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub fallback_tag: String,
    pub tag_map_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: AiProvider::Claude,
            model: None,
            timeout_seconds: 120,
            max_concurrency: 4,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            fallback_tag: FALLBACK_TAG.into(),
            tag_map_path: PathBuf::from("tags_classification_by_llm.csv"),
            data_dir: PathBuf::from("data/boq_files"),
        }
    }
}

impl Config {
    /// Load the user config (defaults when absent) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BoqError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("boq-tagger").join("config.json"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var(PROVIDER_ENV) {
            match provider.parse::<AiProvider>() {
                Ok(p) => self.provider = p,
                Err(e) => tracing::warn!("ignoring {}: {}", PROVIDER_ENV, e),
            }
        }

        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                self.model = Some(model.trim().to_string());
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn set_provider(&mut self, provider: AiProvider) -> Result<()> {
        self.provider = provider;
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.model = Some(model);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, AiProvider::Claude);
        assert_eq!(config.fallback_tag, "General / Preliminaries");
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/boq-tagger/config.json")).unwrap();
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = std::env::temp_dir().join("boq-tagger-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"provider": "gemini", "max_concurrency": 8}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider, AiProvider::Gemini);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.timeout_seconds, 120);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join("boq-tagger-config-roundtrip");
        let path = dir.join("nested").join("config.json");
        let config = Config {
            model: Some("sonnet".into()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model.as_deref(), Some("sonnet"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_attempts_key_and_legacy_name() {
        let dir = std::env::temp_dir().join("boq-tagger-config-attempts");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        std::fs::write(&path, r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().max_attempts, 5);

        std::fs::write(&path, r#"{"max_retries": 2}"#).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().max_attempts, 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}

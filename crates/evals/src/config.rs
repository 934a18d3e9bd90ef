//! Configuration for the evaluation runner
//!
//! Loads a TOML config file from the usual platform config directory
//! (`CARDLAB_CONFIG_PATH` overrides it). Secrets can come from the
//! environment instead: `CARDLAB_STORE_URL`, `CARDLAB_STORE_KEY`, and
//! `OPENAI_API_KEY` or `XAI_API_KEY` for the judge.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "cardlab";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: store::StoreConfig,
    #[serde(default)]
    pub llm: llm::LlmConfig,
    #[serde(default)]
    pub eval: EvalConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Cards per judge request in the three-tier pipeline (default 10)
    pub chunk_size: Option<usize>,
    /// Cards per judge request in the accuracy pass (default 20)
    pub accuracy_chunk_size: Option<usize>,
    /// Base inter-call delay in milliseconds (default 1000)
    pub call_delay_ms: Option<u64>,
}

pub fn get_config_dir() -> Result<PathBuf> {
    // CARDLAB_CONFIG_PATH overrides the default config directory
    if let Ok(path) = std::env::var("CARDLAB_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .context("Could not determine config directory")
}

pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let config_file = get_config_file()?;

    if !config_file.exists() {
        return Ok(Config::default());
    }

    load_config_from(&config_file)
}

pub fn load_config_from(config_file: &Path) -> Result<Config> {
    let contents = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_file.display()))
}

/// Fill in unset secrets from the environment
pub fn apply_env_overrides(config: &mut Config) {
    if config.store.url.is_none() {
        config.store.url = std::env::var("CARDLAB_STORE_URL").ok();
    }
    if config.store.api_key.is_none() {
        config.store.api_key = std::env::var("CARDLAB_STORE_KEY").ok();
    }
    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var("XAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [store]
            url = "https://xyz.supabase.co"
            api_key = "key"

            [llm]
            model = "grok-4"
            base_url = "https://api.x.ai/v1"

            [eval]
            chunk_size = 15
            call_delay_ms = 500
        "#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.store.url.as_deref(), Some("https://xyz.supabase.co"));
        assert_eq!(config.llm.model, "grok-4");
        assert_eq!(config.eval.chunk_size, Some(15));
        assert_eq!(config.eval.call_delay_ms, Some(500));
        assert!(config.eval.accuracy_chunk_size.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert!(config.store.url.is_none());
        assert_eq!(config.llm.provider, "openai");
    }
}

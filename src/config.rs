use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8586".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Base URL of the external RAG engine's HTTP API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable consulted at startup to seed the session's
    /// API key (the "deployment secret store" path). Sidebar input
    /// overrides it.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_base_url() -> String {
    // LightRAG API server's default port.
    "http://127.0.0.1:9621".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> usize {
    16 * 1024 * 1024
}

impl Config {
    /// Built-in defaults for running without a config file.
    pub fn default_local() -> Self {
        Self::default()
    }

    /// Reads the API key from the configured environment variable, if set
    /// and non-empty.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.engine.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Loads the config file if it exists, otherwise falls back to built-in
/// defaults. A present-but-invalid file is still an error.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default_local())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if !config.engine.base_url.starts_with("http://") && !config.engine.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "engine.base_url must be an http(s) URL, got '{}'",
            config.engine.base_url
        );
    }

    if config.engine.timeout_secs == 0 {
        anyhow::bail!("engine.timeout_secs must be > 0");
    }

    if config.ingest.max_file_bytes == 0 {
        anyhow::bail!("ingest.max_file_bytes must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default_local();
        assert!(validate(&config).is_ok());
        assert_eq!(config.server.bind, "127.0.0.1:8586");
        assert_eq!(config.engine.base_url, "http://127.0.0.1:9621");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[server]\nbind = \"0.0.0.0:8080\"\n").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.engine.timeout_secs, 120);
        assert_eq!(config.ingest.max_file_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn rejects_bad_base_url() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("docchat.toml");
        fs::write(&path, "[engine]\nbase_url = \"ftp://nope\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("docchat.toml");
        fs::write(&path, "[engine]\ntimeout_secs = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_config_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8586");
    }
}

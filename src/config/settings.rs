//! Configuration settings for Kino.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// LLM settings for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tool-calling iterations per query.
    pub max_iterations: usize,
    /// OpenAI API key (falls back to the OPENAI_API_KEY environment variable).
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_iterations: 10,
            api_key: None,
        }
    }
}

/// Lookup tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default number of web search results.
    pub web_results: usize,
    /// Default number of movie-info fallback search results.
    pub movie_results: usize,
    /// Default number of video search results.
    pub video_results: usize,
    /// Request timeout in seconds for lookup tools.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            web_results: 5,
            movie_results: 3,
            video_results: 1,
            timeout_seconds: 30,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kino")
            .join("config.toml")
    }

    /// Effective log level: the `-v` flag overrides the configured level.
    pub fn log_level(&self, verbose: u8) -> &str {
        match verbose {
            0 => &self.general.log_level,
            1 => "debug",
            _ => "trace",
        }
    }

    /// Resolve the OpenAI API key from the environment or configuration.
    ///
    /// Absence blocks agent construction up front rather than failing
    /// mid-query.
    pub fn api_key(&self) -> crate::error::Result<String> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        match &self.llm.api_key {
            Some(key) if !key.is_empty() => Ok(key.clone()),
            _ => Err(crate::error::KinoError::Config(
                "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.max_iterations, 10);
        assert_eq!(settings.search.web_results, 5);
        assert_eq!(settings.search.video_results, 1);
    }

    #[test]
    fn test_log_level_verbosity_override() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level(0), "info");
        assert_eq!(settings.log_level(1), "debug");
        assert_eq!(settings.log_level(2), "trace");

        settings.general.log_level = "warn".to_string();
        assert_eq!(settings.log_level(0), "warn");
        assert_eq!(settings.log_level(1), "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("[llm]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.max_iterations, 10);
        assert_eq!(settings.search.timeout_seconds, 30);
    }
}

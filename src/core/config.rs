//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.updown/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::prompt::DEFAULT_QUESTION;
use crate::inference::providers::gemini::DEFAULT_GEMINI_BASE_URL;
use crate::inference::{GenerationConfig, SafetySetting, default_safety_settings};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdownConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub generation: GenerationOverrides,
    /// Replaces the default safety rules when present (an empty list sends none).
    pub safety: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub question: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GenerationOverrides {
    pub stop_sequences: Option<Vec<String>>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// ============================================================================
// Resolved Config (concrete values, no Options except the key)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub question: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub generation: GenerationConfig,
    pub safety: Vec<SafetySetting>,
}

impl ResolvedConfig {
    /// Built-in defaults with the given model and no credentials.
    pub fn for_model(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            question: DEFAULT_QUESTION.to_string(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            generation: GenerationConfig::default(),
            safety: default_safety_settings(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.updown/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".updown").join("config.toml"))
}

/// Load config from `~/.updown/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `UpdownConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<UpdownConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(UpdownConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<UpdownConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(UpdownConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: UpdownConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Solana Up or Down configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "gemini-2.0-flash"          # Or set UPDOWN_MODEL, or pass --model
# question = "Is Solana price going up or down in the next 24 hours? Please give elaborate answer but start with UP or DOWN."

# [gemini]
# api_key = "AIza..."                 # Or set GEMINI_API_KEY env var
# base_url = "https://generativelanguage.googleapis.com/v1beta"

# [generation]
# stop_sequences = ["red"]
# temperature = 0.9
# top_p = 0.1
# top_k = 16
# max_output_tokens = 200

# Listing any [[safety]] entry replaces the defaults below.
# [[safety]]
# category = "HARM_CATEGORY_HARASSMENT"
# threshold = "BLOCK_ONLY_HIGH"

# [[safety]]
# category = "HARM_CATEGORY_HATE_SPEECH"
# threshold = "BLOCK_MEDIUM_AND_ABOVE"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_model` is from the `--model` flag (None = not specified).
pub fn resolve(config: &UpdownConfig, cli_model: Option<&str>) -> ResolvedConfig {
    resolve_with_env(config, cli_model, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env<E>(config: &UpdownConfig, cli_model: Option<&str>, env: E) -> ResolvedConfig
where
    E: Fn(&str) -> Option<String>,
{
    let defaults = ResolvedConfig::for_model(DEFAULT_MODEL);

    // Model: CLI → env → config → default
    let model_name = cli_model
        .map(|s| s.to_string())
        .or_else(|| env("UPDOWN_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or(defaults.model_name);

    let question = config
        .general
        .question
        .as_ref()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .unwrap_or(defaults.question);

    // API key: env → config
    let gemini_api_key = env("GEMINI_API_KEY")
        .or_else(|| config.gemini.api_key.clone())
        .filter(|k| !k.is_empty());

    // Base URL: env → config → default
    let gemini_base_url = env("GEMINI_BASE_URL")
        .or_else(|| config.gemini.base_url.clone())
        .unwrap_or(defaults.gemini_base_url);

    let overrides = &config.generation;
    let base = defaults.generation;
    let generation = GenerationConfig {
        stop_sequences: overrides
            .stop_sequences
            .clone()
            .unwrap_or(base.stop_sequences),
        temperature: overrides.temperature.unwrap_or(base.temperature),
        top_p: overrides.top_p.unwrap_or(base.top_p),
        top_k: overrides.top_k.unwrap_or(base.top_k),
        max_output_tokens: overrides.max_output_tokens.or(base.max_output_tokens),
    };

    ResolvedConfig {
        model_name,
        question,
        gemini_api_key,
        gemini_base_url,
        generation,
        safety: config.safety.clone().unwrap_or(defaults.safety),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{HarmBlockThreshold, HarmCategory};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = UpdownConfig::default();
        assert!(config.safety.is_none());
        assert!(config.general.model.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = UpdownConfig::default();
        let resolved = resolve_with_env(&config, None, no_env);
        assert_eq!(resolved.model_name, DEFAULT_MODEL);
        assert_eq!(resolved.question, DEFAULT_QUESTION);
        assert_eq!(resolved.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(resolved.gemini_api_key.is_none());
        assert_eq!(resolved.generation, GenerationConfig::default());
        assert_eq!(resolved.safety, default_safety_settings());
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = UpdownConfig {
            general: GeneralConfig {
                model: Some("gemini-1.5-pro".to_string()),
                question: Some("Will SOL close green today?".to_string()),
            },
            generation: GenerationOverrides {
                temperature: Some(0.2),
                max_output_tokens: Some(200),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, None, no_env);
        assert_eq!(resolved.model_name, "gemini-1.5-pro");
        assert_eq!(resolved.question, "Will SOL close green today?");
        assert_eq!(resolved.generation.temperature, 0.2);
        assert_eq!(resolved.generation.max_output_tokens, Some(200));
        // Untouched fields keep their defaults
        assert_eq!(resolved.generation.top_k, 16);
    }

    #[test]
    fn test_resolve_cli_model_wins() {
        let config = UpdownConfig {
            general: GeneralConfig {
                model: Some("from-file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| (key == "UPDOWN_MODEL").then(|| "from-env".to_string());
        assert_eq!(resolve_with_env(&config, Some("from-cli"), env).model_name, "from-cli");
        assert_eq!(resolve_with_env(&config, None, env).model_name, "from-env");
    }

    #[test]
    fn test_env_api_key_wins_over_file() {
        let config = UpdownConfig {
            gemini: GeminiConfig {
                api_key: Some("file-key".to_string()),
                base_url: None,
            },
            ..Default::default()
        };
        let env = |key: &str| (key == "GEMINI_API_KEY").then(|| "env-key".to_string());
        let resolved = resolve_with_env(&config, None, env);
        assert_eq!(resolved.gemini_api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_empty_api_key_treated_as_missing() {
        let config = UpdownConfig {
            gemini: GeminiConfig {
                api_key: Some(String::new()),
                base_url: None,
            },
            ..Default::default()
        };
        assert!(resolve_with_env(&config, None, no_env).gemini_api_key.is_none());
    }

    #[test]
    fn test_blank_question_falls_back_to_default() {
        let config = UpdownConfig {
            general: GeneralConfig {
                question: Some("   ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(resolve_with_env(&config, None, no_env).question, DEFAULT_QUESTION);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[general]
model = "gemini-2.0-flash"

[gemini]
api_key = "AIza-test"
base_url = "http://localhost:8080/v1beta"

[generation]
stop_sequences = []
top_k = 40

[[safety]]
category = "HARM_CATEGORY_DANGEROUS_CONTENT"
threshold = "BLOCK_NONE"
"#;
        let config: UpdownConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("AIza-test"));
        assert_eq!(config.generation.top_k, Some(40));

        let resolved = resolve_with_env(&config, None, no_env);
        assert!(resolved.generation.stop_sequences.is_empty());
        assert_eq!(resolved.gemini_base_url, "http://localhost:8080/v1beta");
        assert_eq!(
            resolved.safety,
            vec![SafetySetting {
                category: HarmCategory::DangerousContent,
                threshold: HarmBlockThreshold::BlockNone,
            }]
        );
    }

    #[test]
    fn test_empty_safety_list_disables_rules() {
        let config: UpdownConfig = toml::from_str("safety = []").unwrap();
        assert!(resolve_with_env(&config, None, no_env).safety.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("updown-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nmodel = ").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_generates_commented_default() {
        let dir = std::env::temp_dir().join(format!("updown-gen-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config_from(&path).unwrap();
        assert!(config.general.model.is_none());

        // Everything in the generated file is commented out, so it parses as empty
        let generated = fs::read_to_string(&path).unwrap();
        let reparsed: UpdownConfig = toml::from_str(&generated).unwrap();
        assert!(reparsed.safety.is_none());

        fs::remove_dir_all(&dir).unwrap();
    }
}

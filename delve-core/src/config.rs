//! Configuration system for Delve.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment.
//! Configuration is loaded from `~/.config/delve/config.toml` and/or
//! `.delve/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::research::ResearchConfig;
use crate::search::SearchConfig;

/// Prefix for environment overrides (`DELVE_LLM__MODEL`, `DELVE_GATEWAY__PORT`, ...).
pub const ENV_PREFIX: &str = "DELVE_";

/// Top-level configuration for Delve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DelveConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub research: ResearchConfig,
    pub gateway: GatewayConfig,
}

/// Generation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "gemini", "openai", "ollama", "local".
    pub provider: String,
    /// Default model identifier (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// API key set directly in configuration. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 2048,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl DelveConfig {
    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens must be greater than 0"));
        }
        if self.search.provider.trim().is_empty() {
            return Err(invalid("search.provider must not be empty"));
        }
        if self.research.default_max_results == 0 {
            return Err(invalid(
                "research.default_max_results must be greater than 0",
            ));
        }
        if self.gateway.port == 0 {
            return Err(invalid("gateway.port must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

/// Load configuration from all layers.
///
/// `config_file`, when given, must exist; the user and workspace files are
/// optional.
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<DelveConfig, ConfigError> {
    config_figment(workspace, config_file, ENV_PREFIX)?
        .extract()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

fn config_figment(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    env_prefix: &str,
) -> Result<Figment, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DelveConfig::default()));

    // User-level config
    if let Some(dirs) = directories::ProjectDirs::from("dev", "delve", "delve") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".delve").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (DELVE_LLM__MODEL, DELVE_RESEARCH__MAX_REFINEMENTS, etc.)
    Ok(figment.merge(Env::prefixed(env_prefix).split("__")))
}

/// Whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(dirs) = directories::ProjectDirs::from("dev", "delve", "delve")
        && dirs.config_dir().join("config.toml").exists()
    {
        return true;
    }
    workspace.is_some_and(|ws| ws.join(".delve").join("config.toml").exists())
}

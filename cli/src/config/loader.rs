//! CLI configuration loader for adpilot
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./adpilot.json or ./.adpilot/config.json
//! 3. Git repository root: <repo_root>/.adpilot/config.json
//! 4. User config dir: $XDG_CONFIG_HOME/adpilot/config.json (via `dirs`)
//! 5. Environment variables only (no files)

use adpilot_core::{AgentConfig, ModelParams, Protocol, ResolvedLlmConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// API key variables checked when no config file is found, in preference order
const KEY_VARIABLES: &[(Protocol, &str)] = &[
    (Protocol::Mistral, "MISTRAL_API_KEY"),
    (Protocol::OpenAICompat, "OPENAI_API_KEY"),
    (Protocol::Anthropic, "ANTHROPIC_API_KEY"),
];

/// Raw configuration file format (simple single-file schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name (optional, uses protocol default if not specified)
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Agent loop settings (optional, missing fields keep their defaults)
    #[serde(default)]
    pub agent: Option<AgentConfig>,
}

/// Everything a command needs to build an agent
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub llm: ResolvedLlmConfig,
    pub agent: AgentConfig,
}

/// CLI configuration loader
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Directory the search starts from (defaults to the current directory)
    search_root: Option<PathBuf>,
    /// Skip the user config directory
    skip_user_config: bool,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            config_override: None,
            search_root: None,
            skip_user_config: false,
            protocol_override: None,
            api_key_override: None,
            base_url_override: None,
            model_override: None,
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Start the file search from `root` instead of the current directory
    pub fn with_search_root(mut self, root: PathBuf) -> Self {
        self.search_root = Some(root);
        self
    }

    /// Do not look in the user config directory
    pub fn without_user_config(mut self) -> Self {
        self.skip_user_config = true;
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<LoadedConfig> {
        self.load_with_env(|name| std::env::var(name).ok()).await
    }

    /// Load and resolve configuration, reading variables through `env`
    pub async fn load_with_env<F>(&self, env: F) -> Result<LoadedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            match self.search_files().await? {
                Some(config) => config,
                None => self.config_from_env(&env)?,
            }
        };

        // Step 2: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = Some(model.clone());
        }

        // Step 3: Resolve to final config
        self.resolve_config(config, &env)
    }

    /// Search config files in priority order
    async fn search_files(&self) -> Result<Option<RawConfig>> {
        let root = match &self.search_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };

        // 1. Search root
        for candidate in [
            root.join("adpilot.json"),
            root.join(".adpilot").join("config.json"),
        ] {
            if candidate.is_file() {
                return Ok(Some(self.load_file(&candidate).await?));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&root) {
            let config_path = git_root.join(".adpilot").join("config.json");
            if config_path.is_file() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        // 3. User config directory
        if !self.skip_user_config {
            if let Some(config_dir) = dirs::config_dir() {
                let config_path = config_dir.join("adpilot").join("config.json");
                if config_path.is_file() {
                    return Ok(Some(self.load_file(&config_path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Build a configuration from environment variables only
    fn config_from_env<F>(&self, env: &F) -> Result<RawConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let available: Vec<(Protocol, &str, String)> = KEY_VARIABLES
            .iter()
            .filter_map(|(protocol, var)| env(var).map(|key| (*protocol, *var, key)))
            .collect();
        let available_names: Vec<&str> = available.iter().map(|(p, _, _)| p.as_str()).collect();

        let env_protocol = env("ADPILOT_PROTOCOL");
        let protocol_preference = self.protocol_override.clone().or(env_protocol);

        let (protocol, api_key) = if let Some(preferred) = protocol_preference {
            let protocol = Protocol::parse(&preferred)
                .ok_or_else(|| anyhow!("Unsupported protocol '{}'", preferred))?;
            let key = available
                .iter()
                .find(|(p, _, _)| *p == protocol)
                .map(|(_, _, key)| key.clone())
                .ok_or_else(|| {
                    anyhow!(
                        "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                        preferred,
                        available_names.join(", ")
                    )
                })?;
            (protocol, key)
        } else {
            match available.as_slice() {
                [] => {
                    return Err(anyhow!(
                        "No configuration found. Create an adpilot.json file or set MISTRAL_API_KEY"
                    ))
                }
                [(protocol, var, key)] => {
                    tracing::debug!("Using {} from {}", protocol.as_str(), var);
                    (*protocol, key.clone())
                }
                _ => {
                    return Err(anyhow!(
                        "Multiple API keys detected: {}. Please specify which protocol to use with ADPILOT_PROTOCOL or --protocol",
                        available_names.join(", ")
                    ))
                }
            }
        };

        Ok(RawConfig {
            protocol: protocol.as_str().to_string(),
            api_key,
            base_url: env("ADPILOT_BASE_URL"),
            model: env("ADPILOT_MODEL"),
            params: ModelParams::default(),
            headers: HashMap::new(),
            agent: None,
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        tracing::debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve raw config to core configuration types
    fn resolve_config<F>(&self, config: RawConfig, env: &F) -> Result<LoadedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let protocol = Protocol::parse(&config.protocol)
            .ok_or_else(|| anyhow!("Unsupported protocol '{}'", config.protocol))?;

        // Resolve API key (handle env: prefix)
        let api_key = match config.api_key.strip_prefix("env:") {
            Some(var_name) => env(var_name)
                .with_context(|| format!("Environment variable not found: {}", var_name))?,
            None => config.api_key,
        };

        let base_url = config
            .base_url
            .unwrap_or_else(|| protocol.default_base_url().to_string());
        let model = config
            .model
            .unwrap_or_else(|| protocol.default_model().to_string());

        let llm = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
            .with_params(config.params)
            .with_headers(config.headers);

        llm.validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let agent = config.agent.unwrap_or_default();
        agent
            .validate()
            .map_err(|e| anyhow!("Invalid agent settings: {}", e))?;

        Ok(LoadedConfig { llm, agent })
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk up from `start` looking for a `.git` directory
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

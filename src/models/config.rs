use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLAMA_CLOUD_BASE_URL: &str = "https://api.cloud.llamaindex.ai";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const LLAMA_CLOUD_BASE_URL_ENV: &str = "LLAMA_CLOUD_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub llama_cloud: LlamaCloudConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// `<config dir>/pipeline-provisioner/config.toml`, if the platform has a config dir.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pipeline-provisioner").join("config.toml"))
    }

    /// Load from `explicit` if given, else from the global config path if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Replace base URLs with `OPENAI_BASE_URL` and `LLAMA_CLOUD_BASE_URL` when set.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(OPENAI_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.openai.base_url = url;
        }
        if let Some(url) = lookup(LLAMA_CLOUD_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.llama_cloud.base_url = url;
        }
    }

    /// Reject empty base URLs or env file path, and zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "openai.base_url must not be empty".to_string(),
            ));
        }
        if self.llama_cloud.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llama_cloud.base_url must not be empty".to_string(),
            ));
        }
        if self.openai.timeout_secs == 0 || self.llama_cloud.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.output.env_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.env_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write defaults to `path` (or the global path). Refuses to overwrite unless `force`.
    pub fn init(path: Option<&Path>, force: bool) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path().ok_or_else(|| {
                ConfigError::PathError("could not determine config directory".to_string())
            })?,
        };

        if path.exists() && !force {
            return Err(ConfigError::PathError(format!(
                "config already exists at {} (use --force to overwrite)",
                path.display()
            )));
        }

        Self::default().save_to(&path)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_openai_timeout() -> u64 {
    60
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlamaCloudConfig {
    #[serde(default = "default_llama_cloud_base_url")]
    pub base_url: String,

    #[serde(default = "default_llama_cloud_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

fn default_llama_cloud_base_url() -> String {
    DEFAULT_LLAMA_CLOUD_BASE_URL.to_string()
}

fn default_llama_cloud_timeout() -> u64 {
    120
}

impl Default for LlamaCloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_llama_cloud_base_url(),
            timeout_secs: default_llama_cloud_timeout(),
            project_id: None,
            organization_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(DEFAULT_ENV_FILE)
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
        }
    }
}

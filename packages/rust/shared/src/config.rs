//! Application configuration for Templatesmith.
//!
//! User config lives at `~/.templatesmith/templatesmith.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplatesmithError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "templatesmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".templatesmith";

// ---------------------------------------------------------------------------
// Config structs (matching templatesmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Template download settings.
    #[serde(default)]
    pub fetcher: FetcherSettings,

    /// Chat-completion and prompt settings.
    #[serde(default)]
    pub editor: EditorSettings,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// `[fetcher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherSettings {
    /// Bucket prefix every catalog name is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory downloaded templates are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum in-flight downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    "https://storage.googleapis.com/minioms-saas-increff-com/rms-templates/".into()
}
fn default_output_dir() -> String {
    "templates".into()
}
fn default_concurrency() -> u32 {
    10
}

/// `[editor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Base URL of the OpenAI-compatible chat API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the env var holding the default API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout for a single chat call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory for per-request debug artifacts. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<String>,

    /// Alternative rule book file. The embedded rule book is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            debug_dir: None,
            rules_path: None,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_tokens() -> u32 {
    8000
}
fn default_temperature() -> f32 {
    0.1
}
fn default_request_timeout_secs() -> u64 {
    300
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime download configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Prefix joined with each catalog name to form the download URL.
    pub base_url: String,
    /// Target directory, created if absent.
    pub output_dir: PathBuf,
    /// Maximum concurrent downloads.
    pub concurrency: usize,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.fetcher.base_url.clone(),
            output_dir: PathBuf::from(&config.fetcher.output_dir),
            concurrency: config.fetcher.concurrency.max(1) as usize,
        }
    }
}

/// Runtime editor configuration.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct EditorConfig {
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Credential used when a request does not carry its own.
    pub default_credential: Option<String>,
    pub debug_dir: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
}

impl From<&AppConfig> for EditorConfig {
    fn from(config: &AppConfig) -> Self {
        let editor = &config.editor;
        Self {
            api_base_url: editor.api_base_url.clone(),
            model: editor.model.clone(),
            max_tokens: editor.max_tokens,
            temperature: editor.temperature,
            request_timeout_secs: editor.request_timeout_secs,
            default_credential: resolve_api_key(config),
            debug_dir: editor.debug_dir.as_ref().map(PathBuf::from),
            rules_path: editor.rules_path.as_ref().map(PathBuf::from),
        }
    }
}

impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "default_credential",
                &self.default_credential.as_ref().map(|_| "<redacted>"),
            )
            .field("debug_dir", &self.debug_dir)
            .field("rules_path", &self.rules_path)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.templatesmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TemplatesmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.templatesmith/templatesmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TemplatesmithError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TemplatesmithError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TemplatesmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TemplatesmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TemplatesmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the default API key from the configured env var, if set and non-empty.
pub fn resolve_api_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.editor.api_key_env)
        .ok()
        .filter(|val| !val.trim().is_empty())
}

//! Application configuration for the positioning pipeline.
//!
//! User config lives at `~/.positioning/positioning.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the config file: it only names the
//! environment variables that hold them.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PositioningError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "positioning.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".positioning";

// ---------------------------------------------------------------------------
// Config structs (matching positioning.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Paths for artifacts and reference material.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation provider settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Website collection settings.
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Document rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where every stage reads and writes its artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Analytical playbook; only its phase 2-5 section is used.
    #[serde(default = "default_playbook")]
    pub playbook: String,

    /// Positioning frameworks reference.
    #[serde(default = "default_frameworks")]
    pub frameworks: String,

    /// Known positioning of the major players in the market.
    #[serde(default = "default_messaging_map")]
    pub messaging_map: String,

    /// Complete example brief used to pin the output schema.
    #[serde(default = "default_example_brief")]
    pub example_brief: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            playbook: default_playbook(),
            frameworks: default_frameworks(),
            messaging_map: default_messaging_map(),
            example_brief: default_example_brief(),
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_playbook() -> String {
    "SKILL.md".into()
}
fn default_frameworks() -> String {
    "references/positioning-frameworks.md".into()
}
fn default_messaging_map() -> String {
    "references/neobank-messaging-map.md".into()
}
fn default_example_brief() -> String {
    "examples/kast-brief.json".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Name of the env var holding the Anthropic key.
    #[serde(default = "default_anthropic_key_env")]
    pub anthropic_api_key_env: String,

    /// Name of the env var holding the OpenRouter key.
    #[serde(default = "default_openrouter_key_env")]
    pub openrouter_api_key_env: String,

    /// Model used with the Anthropic provider when none is given.
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    /// Model used with the OpenRouter provider when none is given.
    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,

    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,

    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,

    /// Output token ceiling sent with every request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Repair prompts allowed after the first response fails validation.
    #[serde(default = "default_repair_attempts")]
    pub repair_attempts: u32,

    /// Whole-request timeout for a generation call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key_env: default_anthropic_key_env(),
            openrouter_api_key_env: default_openrouter_key_env(),
            anthropic_model: default_anthropic_model(),
            openrouter_model: default_openrouter_model(),
            anthropic_base_url: default_anthropic_base_url(),
            openrouter_base_url: default_openrouter_base_url(),
            max_tokens: default_max_tokens(),
            repair_attempts: default_repair_attempts(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_anthropic_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}
fn default_openrouter_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_anthropic_model() -> String {
    "claude-sonnet-4-5-20250514".into()
}
fn default_openrouter_model() -> String {
    "anthropic/claude-sonnet-4-5-20250514".into()
}
fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_repair_attempts() -> u32 {
    1
}
fn default_request_timeout() -> u64 {
    300
}

/// `[collection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Pause after each page load before extraction.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Per-page fetch timeout.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Non-homepage pages with less body text than this are dropped.
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pages tried for every company, in order.
    #[serde(default = "default_pages")]
    pub pages: Vec<PageTarget>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            page_timeout_secs: default_page_timeout(),
            min_body_chars: default_min_body_chars(),
            user_agent: default_user_agent(),
            pages: default_pages(),
        }
    }
}

/// One `[[collection.pages]]` entry: a site path and the page type it yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTarget {
    /// Path appended to the website root (empty for the homepage).
    pub path: String,
    /// Page type recorded on the collected page.
    pub page_type: String,
}

impl PageTarget {
    fn new(path: &str, page_type: &str) -> Self {
        Self {
            path: path.into(),
            page_type: page_type.into(),
        }
    }
}

fn default_settle_ms() -> u64 {
    2000
}
fn default_page_timeout() -> u64 {
    20
}
fn default_min_body_chars() -> usize {
    200
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".into()
}
fn default_pages() -> Vec<PageTarget> {
    vec![
        PageTarget::new("", crate::types::HOMEPAGE),
        PageTarget::new("/about", "about"),
        PageTarget::new("/about-us", "about"),
        PageTarget::new("/features", "features"),
        PageTarget::new("/pricing", "pricing"),
        PageTarget::new("/products", "products"),
        PageTarget::new("/why-us", "why"),
    ]
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// External HTML-to-PDF command, invoked as `<cmd> <in.html> <out.pdf>`.
    #[serde(default = "default_compositor")]
    pub compositor: String,

    /// Set to false to emit markup only.
    #[serde(default = "default_true")]
    pub binary_output: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            compositor: default_compositor(),
            binary_output: true,
        }
    }
}

fn default_compositor() -> String {
    "weasyprint".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Collection config (runtime, derived from the config file)
// ---------------------------------------------------------------------------

/// Runtime collection configuration.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub settle: Duration,
    pub page_timeout: Duration,
    pub min_body_chars: usize,
    pub user_agent: String,
    pub pages: Vec<PageTarget>,
}

impl From<&AppConfig> for CollectConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.collection.settle_ms),
            page_timeout: Duration::from_secs(config.collection.page_timeout_secs),
            min_body_chars: config.collection.min_body_chars,
            user_agent: config.collection.user_agent.clone(),
            pages: config.collection.pages.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment snapshot
// ---------------------------------------------------------------------------

/// Key-value environment captured once at startup.
///
/// Values already present (from the process) win over values read from
/// the override file. The process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs (tests, embedding).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Merge a `KEY=value` override file. Missing files are ignored;
    /// keys already set and empty values are skipped.
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            debug!(?path, "env file not found, skipping");
            return Ok(0);
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            PositioningError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let mut merged = 0;
        for item in iter {
            let (key, value) = item.map_err(|e| {
                PositioningError::config(format!("failed to parse {}: {e}", path.display()))
            })?;
            if key.is_empty() || value.is_empty() || self.vars.contains_key(&key) {
                continue;
            }
            self.vars.insert(key, value);
            merged += 1;
        }

        debug!(?path, merged, "env file merged");
        Ok(merged)
    }

    /// Look up a non-empty value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Provider resolution
// ---------------------------------------------------------------------------

/// Generation service provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    Anthropic,
    OpenRouter,
}

impl ProviderChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(format!(
                "unknown provider '{other}': expected 'anthropic' or 'openrouter'"
            )),
        }
    }
}

/// Explicit per-invocation overrides (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct GenerationOverrides {
    pub provider: Option<ProviderChoice>,
    pub model: Option<String>,
}

/// Fully resolved generation settings threaded into the synthesis stage.
#[derive(Clone)]
pub struct GenerationSettings {
    pub provider: ProviderChoice,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub repair_attempts: u32,
    pub request_timeout: Duration,
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("repair_attempts", &self.repair_attempts)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Pick the provider and credential.
///
/// Order: explicit override, then whichever credential is set
/// (Anthropic first). A chosen provider without its credential is an error.
pub fn resolve_generation(
    config: &AppConfig,
    env: &EnvVars,
    overrides: &GenerationOverrides,
) -> Result<GenerationSettings> {
    let generation = &config.generation;
    let anthropic_key = env.get(&generation.anthropic_api_key_env);
    let openrouter_key = env.get(&generation.openrouter_api_key_env);

    let provider = match overrides.provider {
        Some(p) => p,
        None if anthropic_key.is_some() => ProviderChoice::Anthropic,
        None if openrouter_key.is_some() => ProviderChoice::OpenRouter,
        None => {
            return Err(PositioningError::config(format!(
                "no generation credential found. Set {} or {} (in the environment or the .env file)",
                generation.anthropic_api_key_env, generation.openrouter_api_key_env
            )));
        }
    };

    let (key, key_env, default_model, base_url) = match provider {
        ProviderChoice::Anthropic => (
            anthropic_key,
            &generation.anthropic_api_key_env,
            &generation.anthropic_model,
            &generation.anthropic_base_url,
        ),
        ProviderChoice::OpenRouter => (
            openrouter_key,
            &generation.openrouter_api_key_env,
            &generation.openrouter_model,
            &generation.openrouter_base_url,
        ),
    };

    let api_key = key.ok_or_else(|| {
        PositioningError::config(format!("{key_env} not set (required by provider {provider})"))
    })?;

    let model = overrides
        .model
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_model.clone());

    Ok(GenerationSettings {
        provider,
        api_key: api_key.to_string(),
        model,
        base_url: base_url.trim_end_matches('/').to_string(),
        max_tokens: generation.max_tokens,
        repair_attempts: generation.repair_attempts,
        request_timeout: Duration::from_secs(generation.request_timeout_secs),
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.positioning/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PositioningError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.positioning/positioning.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PositioningError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PositioningError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PositioningError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PositioningError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PositioningError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

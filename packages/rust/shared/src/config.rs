//! Application configuration for prgen.
//!
//! Config is read from `./prgen.toml` or `~/.prgen/prgen.toml` (first found
//! wins). Environment variables override file values, and CLI flags override
//! both. Missing files fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PrgenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "prgen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prgen";

// ---------------------------------------------------------------------------
// Config structs (matching prgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Prompt template locations.
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Where generated documents go.
    #[serde(default)]
    pub output: OutputConfig,

    /// Diff collection limits.
    #[serde(default)]
    pub diff: DiffConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: ollama, openai, groq, openrouter or mock.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the local Ollama server.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Base URL for OpenAI-compatible APIs. Derived from the provider when empty.
    #[serde(default)]
    pub api_base_url: String,

    /// Env vars holding the API key, checked in order (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Vec<String>,

    /// Request timeout for a whole generation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            ollama_url: default_ollama_url(),
            api_base_url: String::new(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.1".into()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_api_key_env() -> Vec<String> {
    vec![
        "PRGEN_API_KEY".into(),
        "OPENAI_API_KEY".into(),
        "GROQ_API_KEY".into(),
    ]
}
fn default_timeout_secs() -> u64 {
    600
}

impl LlmConfig {
    /// Base URL for the configured OpenAI-compatible provider.
    ///
    /// An explicit `api_base_url` always wins; otherwise well-known providers
    /// map to their public endpoints.
    pub fn effective_base_url(&self) -> Option<String> {
        if !self.api_base_url.is_empty() {
            return Some(self.api_base_url.clone());
        }
        let url = match self.provider.to_ascii_lowercase().as_str() {
            "groq" => "https://api.groq.com/openai/v1",
            "openai" => "https://api.openai.com/v1",
            "openrouter" => "https://openrouter.ai/api/v1",
            _ => return None,
        };
        Some(url.to_string())
    }

    /// Resolve the API key from the first non-empty env var in `api_key_env`.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Like [`LlmConfig::api_key`] but with an injectable env lookup.
    pub fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.is_empty())
    }
}

/// `[prompts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// PR description template.
    #[serde(default = "default_base_prompt")]
    pub base: String,

    /// Optional team-wide instructions appended to every PR prompt.
    #[serde(default = "default_extra_prompt")]
    pub extra: String,

    /// Commit message template.
    #[serde(default = "default_commit_prompt")]
    pub commit: String,

    /// Code review template.
    #[serde(default = "default_review_prompt")]
    pub review: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            base: default_base_prompt(),
            extra: default_extra_prompt(),
            commit: default_commit_prompt(),
            review: default_review_prompt(),
        }
    }
}

fn default_base_prompt() -> String {
    "prompts/base.md".into()
}
fn default_extra_prompt() -> String {
    "~/.prgen/extra_prompt.md".into()
}
fn default_commit_prompt() -> String {
    "prompts/commit.md".into()
}
fn default_review_prompt() -> String {
    "prompts/review.md".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for saved PR documents.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Copy the final document to the system clipboard.
    #[serde(default = "default_true")]
    pub copy_to_clipboard: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            copy_to_clipboard: true,
        }
    }
}

fn default_save_path() -> String {
    "~/prgen".into()
}
fn default_true() -> bool {
    true
}

/// `[diff]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Maximum diff characters sent to the model.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Pathspec patterns excluded from diffs (lockfiles, minified bundles).
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            ignore: default_ignore(),
        }
    }
}

fn default_max_chars() -> usize {
    12_000
}
fn default_ignore() -> Vec<String> {
    ["package-lock.json", "yarn.lock", "composer.lock", "go.sum", "*.min.js"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.prgen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PrgenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.prgen/prgen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// Looks for `prgen.toml` in the current directory, then in `~/.prgen/`.
/// Returns defaults if neither exists. Env overrides are applied on top and
/// `~` in path settings is expanded.
pub fn load_config() -> Result<AppConfig> {
    let candidates = [
        Some(PathBuf::from(CONFIG_FILE_NAME)),
        config_file_path().ok(),
    ];

    let mut config = match candidates.into_iter().flatten().find(|p| p.exists()) {
        Some(path) => {
            tracing::debug!(?path, "loading config file");
            load_config_from(&path)?
        }
        None => {
            tracing::debug!("config file not found, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    expand_paths(&mut config);
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PrgenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PrgenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PrgenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PrgenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PrgenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Apply `PRGEN_*` environment overrides from the process environment.
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_env_overrides_from(config, |name| std::env::var(name).ok());
}

/// Apply `PRGEN_*` overrides using the given lookup. Empty values are ignored.
pub fn apply_env_overrides_from(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let overrides: [(&str, &mut String); 4] = [
        ("PRGEN_PROVIDER", &mut config.llm.provider),
        ("PRGEN_MODEL", &mut config.llm.model),
        ("PRGEN_OLLAMA_URL", &mut config.llm.ollama_url),
        ("PRGEN_API_BASE_URL", &mut config.llm.api_base_url),
    ];

    for (name, slot) in overrides {
        if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
            tracing::debug!(var = name, "config value overridden from environment");
            *slot = value;
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn expand_paths(config: &mut AppConfig) {
    for path in [
        &mut config.prompts.base,
        &mut config.prompts.extra,
        &mut config.prompts.commit,
        &mut config.prompts.review,
        &mut config.output.save_path,
    ] {
        *path = expand_home(path);
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home.to_string_lossy().into_owned(),
        Some(home) => home.join(rest).to_string_lossy().into_owned(),
        None => path.to_string(),
    }
}

/// Mask a secret for display, keeping only its first and last four characters.
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None | Some("") => "(not set)".into(),
        Some(s) => {
            let count = s.chars().count();
            if count <= 8 {
                return "****".into();
            }
            let head: String = s.chars().take(4).collect();
            let tail: String = s.chars().skip(count - 4).collect();
            format!("{head}****{tail}")
        }
    }
}

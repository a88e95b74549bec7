//! Model providers for prgen.
//!
//! [`LlmClient`] is built from the `[llm]` config section and hides which
//! backend answers. Providers:
//! - `ollama`: local Ollama server, NDJSON `/api/generate`
//! - `openai`, `groq`, `openrouter`: OpenAI-compatible `/chat/completions` (SSE)
//! - `mock`: canned response, no network
//!
//! No call is retried. A non-success status becomes
//! [`PrgenError::Generation`] with a short hint for the common cases.

mod mock;
mod ollama;
mod openai;

use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use prgen_shared::{LlmConfig, PrgenError, Result};

pub use mock::{DEFAULT_MOCK_RESPONSE, MockClient};
pub use ollama::{OllamaClient, parse_ollama_stream};
pub use openai::{OpenAiClient, parse_sse_stream};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("prgen/", env!("CARGO_PKG_VERSION"));

/// Provider names accepted in `llm.provider`.
pub const PROVIDERS: [&str; 5] = ["ollama", "openai", "groq", "openrouter", "mock"];

// ---------------------------------------------------------------------------
// LlmClient
// ---------------------------------------------------------------------------

/// A configured model backend.
#[derive(Debug, Clone)]
pub enum LlmClient {
    Ollama(OllamaClient),
    OpenAi(OpenAiClient),
    Mock(MockClient),
}

impl LlmClient {
    /// Build the client selected by `config.provider`.
    ///
    /// Fails on an unknown provider, an invalid base URL, or a missing API key
    /// for the hosted providers.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::from_config_with_key(config, config.api_key())
    }

    /// Like [`LlmClient::from_config`] with the API key already resolved.
    pub fn from_config_with_key(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let provider = config.provider.trim().to_ascii_lowercase();
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = match provider.as_str() {
            "ollama" => {
                let base = parse_base_url(&config.ollama_url)?;
                Self::Ollama(OllamaClient::new(build_http(timeout)?, base, &config.model))
            }
            "openai" | "groq" | "openrouter" => {
                let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                    PrgenError::config(format!(
                        "an API key is required for provider '{provider}': set one of {}",
                        config.api_key_env.join(", ")
                    ))
                })?;
                let base = config.effective_base_url().ok_or_else(|| {
                    PrgenError::config(format!("no base URL known for provider '{provider}'"))
                })?;
                let base = parse_base_url(&base)?;
                Self::OpenAi(OpenAiClient::new(build_http(timeout)?, base, &config.model, api_key))
            }
            "mock" => Self::Mock(MockClient::default()),
            other => {
                return Err(PrgenError::validation(format!(
                    "unknown LLM provider '{other}': supported are {}",
                    PROVIDERS.join(", ")
                )));
            }
        };

        info!(provider = %provider, name = %client.name(), "LLM client ready");
        Ok(client)
    }

    /// Human-readable backend identifier, e.g. `ollama/llama3.1`.
    pub fn name(&self) -> String {
        match self {
            Self::Ollama(c) => c.name(),
            Self::OpenAi(c) => c.name(),
            Self::Mock(c) => c.name(),
        }
    }

    /// Send `prompt` and return the whole accumulated response.
    #[instrument(skip_all, fields(provider = %self.name(), prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Ollama(c) => c.generate(prompt).await,
            Self::OpenAi(c) => c.generate(prompt).await,
            Self::Mock(c) => Ok(c.generate(prompt)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_http(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| PrgenError::Network(format!("failed to build HTTP client: {e}")))
}

/// Validate a configured base URL (http or https only).
fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PrgenError::config(format!("invalid base URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(PrgenError::config(format!(
            "unsupported URL scheme '{scheme}' in '{raw}'"
        ))),
    }
}

/// `base` joined with `path`, keeping any path prefix in `base` (`/openai/v1`).
fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Hint appended to a failed status, in the `" → ..."` form.
pub fn status_hint(status: u16, model: &str) -> String {
    let hint = match status {
        401 => "API key inválida o no configurada (PRGEN_API_KEY / GROQ_API_KEY)".to_string(),
        403 => "Sin permisos para este modelo".to_string(),
        404 => format!("Modelo '{model}' no encontrado. Verifica el nombre del modelo en tu config"),
        429 => "Rate limit alcanzado. Espera unos segundos o cambia de proveedor".to_string(),
        503 => "Proveedor temporalmente no disponible. Intenta de nuevo en unos minutos".to_string(),
        _ => return String::new(),
    };
    format!(" → {hint}")
}

/// Turn a non-success response into [`PrgenError::Generation`].
async fn generation_error(response: reqwest::Response, hint: String) -> PrgenError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    PrgenError::Generation { status, hint, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn builds_each_provider() {
        let ollama = LlmClient::from_config_with_key(&config("ollama"), None).unwrap();
        assert!(matches!(ollama, LlmClient::Ollama(_)));
        assert_eq!(ollama.name(), "ollama/llama3.1");

        for provider in ["openai", "groq", "OpenRouter"] {
            let client =
                LlmClient::from_config_with_key(&config(provider), Some("sk-test".into())).unwrap();
            assert!(matches!(client, LlmClient::OpenAi(_)), "{provider}");
        }

        let mock = LlmClient::from_config_with_key(&config("mock"), None).unwrap();
        assert_eq!(mock.name(), "mock");
    }

    #[test]
    fn hosted_provider_requires_key() {
        let err = LlmClient::from_config_with_key(&config("groq"), None).unwrap_err();
        assert!(matches!(err, PrgenError::Config { .. }));
        assert!(err.to_string().contains("PRGEN_API_KEY"));

        let err = LlmClient::from_config_with_key(&config("groq"), Some(String::new())).unwrap_err();
        assert!(matches!(err, PrgenError::Config { .. }));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = LlmClient::from_config_with_key(&config("gemini"), None).unwrap_err();
        assert!(matches!(err, PrgenError::Validation { .. }));
        assert!(err.to_string().contains("ollama, openai, groq, openrouter, mock"));
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        let mut cfg = config("ollama");
        cfg.ollama_url = "not a url".into();
        assert!(LlmClient::from_config_with_key(&cfg, None).is_err());

        cfg.ollama_url = "ftp://localhost:11434".into();
        let err = LlmClient::from_config_with_key(&cfg, None).unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"));
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let base = Url::parse("https://api.groq.com/openai/v1").unwrap();
        assert_eq!(
            endpoint(&base, "/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        let base = Url::parse("http://localhost:11434/").unwrap();
        assert_eq!(endpoint(&base, "api/generate"), "http://localhost:11434/api/generate");
    }

    #[test]
    fn status_hints() {
        assert!(status_hint(401, "m").contains("API key"));
        assert!(status_hint(403, "m").contains("permisos"));
        assert!(status_hint(404, "llama3").contains("'llama3'"));
        assert!(status_hint(429, "m").contains("Rate limit"));
        assert!(status_hint(503, "m").contains("no disponible"));
        assert!(status_hint(404, "m").starts_with(" → "));
        assert_eq!(status_hint(500, "m"), "");
    }

    #[tokio::test]
    async fn mock_generate_returns_canned_body() {
        let client = LlmClient::from_config_with_key(&config("mock"), None).unwrap();
        let body = client.generate("anything").await.unwrap();
        assert_eq!(body, DEFAULT_MOCK_RESPONSE);
    }
}

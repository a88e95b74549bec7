//! Local Ollama backend (`POST /api/generate`, streamed NDJSON).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use prgen_shared::{PrgenError, Result};

use crate::{endpoint, generation_error};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(http: Client, base: Url, model: &str) -> Self {
        Self {
            http,
            base,
            model: model.to_string(),
        }
    }

    pub fn name(&self) -> String {
        format!("ollama/{}", self.model)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = endpoint(&self.base, "api/generate");
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let hint = if e.is_connect() {
                    " → Ollama no está corriendo. Ejecuta 'ollama serve' primero"
                } else {
                    ""
                };
                PrgenError::Network(format!("{url}: {e}{hint}"))
            })?;

        if !response.status().is_success() {
            let hint = if response.status().as_u16() == 404 {
                format!(" → Modelo no encontrado. ¿Ejecutaste 'ollama pull {}'?", self.model)
            } else {
                String::new()
            };
            return Err(generation_error(response, hint).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PrgenError::Network(format!("{url}: failed to read body: {e}")))?;

        let text = parse_ollama_stream(&body);
        debug!(body_len = body.len(), response_len = text.len(), "ollama response collected");
        Ok(text)
    }
}

/// Concatenate the `response` fields of an NDJSON stream, stopping at the
/// first `done: true` chunk. Lines that are not valid chunks are skipped.
pub fn parse_ollama_stream(body: &str) -> String {
    let mut out = String::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok(chunk) = serde_json::from_str::<GenerateChunk>(line) else {
            continue;
        };
        out.push_str(&chunk.response);
        if chunk.done {
            break;
        }
    }
    out
}

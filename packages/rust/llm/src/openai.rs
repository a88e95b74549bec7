//! OpenAI-compatible chat completions (OpenAI, Groq, OpenRouter).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use prgen_shared::{PrgenError, Result};

use crate::{endpoint, generation_error, status_hint};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// One SSE `data:` payload.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any API that speaks the OpenAI chat completions protocol.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base: Url,
    model: String,
    api_key: String,
}

// Keep the key out of debug output.
impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base", &self.base.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(http: Client, base: Url, model: &str, api_key: String) -> Self {
        Self {
            http,
            base,
            model: model.to_string(),
            api_key,
        }
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), self.model)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = endpoint(&self.base, "chat/completions");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: true,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PrgenError::Network(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            let hint = status_hint(response.status().as_u16(), &self.model);
            return Err(generation_error(response, hint).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PrgenError::Network(format!("{url}: failed to read body: {e}")))?;

        let text = parse_sse_stream(&body);
        debug!(body_len = body.len(), response_len = text.len(), "chat completion collected");
        Ok(text)
    }
}

/// Concatenate `choices[].delta.content` from an SSE body until `[DONE]`.
///
/// Only `data:` lines are considered; comments, event names and payloads
/// that fail to parse are skipped.
pub fn parse_sse_stream(body: &str) -> String {
    let mut out = String::new();
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
            continue;
        };
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                out.push_str(&content);
            }
        }
    }
    out
}

//! Grounded chat: ask one question against a grounding context.
//!
//! The request always has two turns: a system turn carrying the grounding
//! instruction with the context interpolated (see [`crate::prompts`]) and a
//! user turn carrying the question verbatim.
//!
//! ## Transports
//!
//! * **Ollama-native** (default) — `POST {chat_url}` with
//!   `{model, messages, stream: false}`; the answer is read from
//!   `message.content`.
//! * **edgequake-llm provider** — when a provider (or provider name) is
//!   configured, the same two messages go through
//!   [`edgequake_llm::LLMProvider::chat`].
//!
//! Each question is a single attempt. The caller decides whether to resubmit.

use crate::config::PipelineConfig;
use crate::error::DocQaError;
use crate::prompts::grounded_system_message;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Client for one configured chat endpoint.
pub struct GroundedChatClient {
    transport: ChatTransport,
    model: String,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    timeout: Duration,
}

enum ChatTransport {
    Ollama {
        http: reqwest::Client,
        url: String,
    },
    Provider {
        name: String,
        provider: Arc<dyn LLMProvider>,
    },
}

impl fmt::Debug for GroundedChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundedChatClient")
            .field("endpoint", &self.endpoint())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GroundedChatClient {
    /// Build a client from the pipeline configuration.
    ///
    /// Transport resolution, most specific first:
    /// 1. `config.provider` — pre-built provider, used as-is
    /// 2. `config.provider_name` (other than `"ollama"`) — created through
    ///    [`ProviderFactory::create_llm_provider`] with `config.model`
    /// 3. Ollama-native HTTP against `config.chat_url`
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DocQaError> {
        let timeout = Duration::from_secs(config.chat_timeout_secs);

        let transport = if let Some(ref provider) = config.provider {
            ChatTransport::Provider {
                name: config
                    .provider_name
                    .clone()
                    .unwrap_or_else(|| "custom".to_string()),
                provider: Arc::clone(provider),
            }
        } else if let Some(name) = config
            .provider_name
            .as_deref()
            .filter(|n| !n.eq_ignore_ascii_case("ollama"))
        {
            let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(
                |e| DocQaError::ProviderNotConfigured {
                    provider: name.to_string(),
                    hint: format!("{e}"),
                },
            )?;
            ChatTransport::Provider {
                name: name.to_string(),
                provider,
            }
        } else {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| DocQaError::Internal(format!("HTTP client: {e}")))?;
            ChatTransport::Ollama {
                http,
                url: config.chat_url.clone(),
            }
        };

        Ok(Self {
            transport,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    /// Endpoint description for logs and errors: the URL, or `provider:<name>`.
    pub fn endpoint(&self) -> String {
        match &self.transport {
            ChatTransport::Ollama { url, .. } => url.clone(),
            ChatTransport::Provider { name, .. } => format!("provider:{name}"),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask `question` against `context` and return the answer text unchanged.
    ///
    /// An empty context is valid. An empty (or whitespace-only) question is
    /// rejected with [`DocQaError::EmptyQuestion`] before anything is sent.
    ///
    /// # Errors
    /// - [`DocQaError::ChatTransportError`] — network failure, timeout, non-2xx
    /// - [`DocQaError::ChatResponseFormatError`] — body lacks `message.content`
    pub async fn ask(&self, context: &str, question: &str) -> Result<String, DocQaError> {
        if question.trim().is_empty() {
            return Err(DocQaError::EmptyQuestion);
        }

        let system = grounded_system_message(self.system_prompt.as_deref(), context);
        info!(
            "Asking {} ({}): {} context chars",
            self.endpoint(),
            self.model,
            context.len()
        );

        match &self.transport {
            ChatTransport::Ollama { http, url } => {
                let body = OllamaChatRequest::new(&self.model, &system, question, self.temperature);
                self.ask_ollama(http, url, &body).await
            }
            ChatTransport::Provider { provider, .. } => {
                self.ask_provider(provider, &system, question).await
            }
        }
    }

    async fn ask_ollama(
        &self,
        http: &reqwest::Client,
        url: &str,
        body: &OllamaChatRequest<'_>,
    ) -> Result<String, DocQaError> {
        let response = http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(url, None, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, Some(status.as_u16()), &e))?;

        if !status.is_success() {
            return Err(DocQaError::ChatTransportError {
                endpoint: url.to_string(),
                status: Some(status.as_u16()),
                reason: error_reason(&text),
            });
        }

        let answer = parse_answer(url, &text)?;
        debug!("Answer: {} chars", answer.len());
        Ok(answer)
    }

    async fn ask_provider(
        &self,
        provider: &Arc<dyn LLMProvider>,
        system: &str,
        question: &str,
    ) -> Result<String, DocQaError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(question)];
        let options = CompletionOptions {
            temperature: self.temperature,
            ..Default::default()
        };

        let endpoint = self.endpoint();
        match tokio::time::timeout(self.timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "Answer: {} chars, {} prompt / {} completion tokens",
                    response.content.len(),
                    response.prompt_tokens,
                    response.completion_tokens
                );
                Ok(response.content)
            }
            Ok(Err(e)) => Err(DocQaError::ChatTransportError {
                endpoint,
                status: None,
                reason: e.to_string(),
            }),
            Err(_) => Err(DocQaError::ChatTransportError {
                endpoint,
                status: None,
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        }
    }

    fn transport_error(&self, url: &str, status: Option<u16>, e: &reqwest::Error) -> DocQaError {
        let reason = if e.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else {
            e.to_string()
        };
        DocQaError::ChatTransportError {
            endpoint: url.to_string(),
            status,
            reason,
        }
    }
}

// ── Ollama wire format ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

impl<'a> OllamaChatRequest<'a> {
    fn new(model: &'a str, system: &'a str, question: &'a str, temperature: Option<f32>) -> Self {
        Self {
            model,
            messages: [
                WireMessage {
                    role: "system",
                    content: system,
                },
                WireMessage {
                    role: "user",
                    content: question,
                },
            ],
            stream: false,
            options: temperature.map(|temperature| OllamaOptions { temperature }),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Extract `message.content` from a 2xx response body.
fn parse_answer(endpoint: &str, body: &str) -> Result<String, DocQaError> {
    let parsed: OllamaChatResponse =
        serde_json::from_str(body).map_err(|e| DocQaError::ChatResponseFormatError {
            endpoint: endpoint.to_string(),
            detail: format!("body is not valid JSON: {e}"),
        })?;

    parsed
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| DocQaError::ChatResponseFormatError {
            endpoint: endpoint.to_string(),
            detail: "missing message.content".to_string(),
        })
}

/// Human-readable reason for a non-2xx response: Ollama's `error` field when
/// present, otherwise the (truncated) body.
fn error_reason(body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<OllamaErrorBody>(body) {
        return err.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}\u{2026}", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

use crate::config::Settings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SYSTEM_CONTINUATION: &str =
    "You are a skilled writer. Continue the user's text in the same voice and style.";
const SYSTEM_SUMMARIZATION: &str = "You are a helpful assistant that summarizes text.";

/// Prompt template selected per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Free-form continuation of the chunk text.
    Continuation,
    /// Condensation of the chunk text.
    Summarization,
}

impl Mode {
    /// Returns the fixed system-role instruction for this mode.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Continuation => SYSTEM_CONTINUATION,
            Self::Summarization => SYSTEM_SUMMARIZATION,
        }
    }

    /// Embeds a chunk into the user-role message for this mode.
    #[must_use]
    pub fn user_prompt(self, chunk: &str) -> String {
        match self {
            Self::Continuation => format!("Continue the following text: {chunk}"),
            Self::Summarization => format!("Please summarize the following text: {chunk}"),
        }
    }
}

/// One unit of work for the completion endpoint.
///
/// Immutable; has no identity beyond its position in the input sequence.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Chunk text to embed in the user message
    pub text: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature in [0, 2]
    pub temperature: f32,
    /// Prompt template kind
    pub mode: Mode,
}

impl CompletionRequest {
    /// Creates a request, validating the temperature range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `temperature` is outside [0, 2].
    pub fn new(
        text: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        mode: Mode,
    ) -> Result<Self> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::config(format!(
                "temperature {temperature} is outside the valid range [0, 2]"
            )));
        }

        Ok(Self {
            text: text.into(),
            model: model.into(),
            temperature,
            mode,
        })
    }
}

/// Synchronous completion backend.
///
/// The HTTP client implements this for the real endpoint; tests substitute
/// scripted fakes so the pipeline and session run without a network.
pub trait CompletionBackend: Send + Sync {
    /// Sends one request and returns the trimmed text of the first candidate.
    ///
    /// # Errors
    ///
    /// Returns a remote error (network, endpoint status, malformed body)
    /// without retrying; the caller owns any abort-vs-continue decision.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Blocking HTTP client for a chat-completion endpoint.
pub struct HttpCompletionClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    max_response_tokens: u32,
}

impl HttpCompletionClient {
    /// Creates a client from settings, resolving the API credential.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available or the underlying HTTP
    /// client cannot be constructed.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_response_tokens: settings.max_response_tokens,
        })
    }

    /// Builds the JSON request body for one completion call.
    fn build_request_body(&self, request: &CompletionRequest) -> ChatRequest {
        debug!(
            model = %request.model,
            temperature = request.temperature,
            mode = ?request.mode,
            "building completion request"
        );

        ChatRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.mode.system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: request.mode.user_prompt(&request.text),
                },
            ],
            max_tokens: self.max_response_tokens,
            n: 1,
            temperature: request.temperature,
        }
    }
}

impl CompletionBackend for HttpCompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(request);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_else(|_| status.to_string());
            return Err(Error::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::invalid_response(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_response("response contained no choices"))?;

        Ok(choice.message.content.trim().to_string())
    }
}

// Wire types for the chat-completion endpoint

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    n: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpCompletionClient {
        HttpCompletionClient {
            http: reqwest::blocking::Client::new(),
            api_key: "test-key".to_string(),
            base_url: "https://example.test/v1".to_string(),
            max_response_tokens: 1750,
        }
    }

    #[test]
    fn test_mode_prompts_differ() {
        assert_ne!(
            Mode::Continuation.system_prompt(),
            Mode::Summarization.system_prompt()
        );
        assert!(
            Mode::Summarization
                .user_prompt("some text")
                .contains("summarize")
        );
        assert!(Mode::Continuation.user_prompt("some text").contains("some text"));
    }

    #[test]
    fn test_request_temperature_range() {
        assert!(CompletionRequest::new("t", "m", 0.0, Mode::Continuation).is_ok());
        assert!(CompletionRequest::new("t", "m", 2.0, Mode::Continuation).is_ok());
        assert!(CompletionRequest::new("t", "m", -0.1, Mode::Continuation).is_err());
        assert!(CompletionRequest::new("t", "m", 2.1, Mode::Continuation).is_err());
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client();
        let request =
            CompletionRequest::new("alpha beta", "gpt-3.5-turbo", 0.5, Mode::Continuation)
                .unwrap();

        let body = client.build_request_body(&request);

        assert_eq!(body.model, "gpt-3.5-turbo");
        assert_eq!(body.max_tokens, 1750);
        assert_eq!(body.n, 1);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
        assert!(body.messages[1].content.contains("alpha beta"));
    }

    #[test]
    fn test_build_request_body_summary_mode() {
        let client = test_client();
        let request =
            CompletionRequest::new("long text", "gpt-4", 0.2, Mode::Summarization).unwrap();

        let body = client.build_request_body(&request);

        assert_eq!(body.messages[0].content, SYSTEM_SUMMARIZATION);
        assert!(body.messages[1].content.starts_with("Please summarize"));
    }

    #[test]
    fn test_request_body_serializes_expected_fields() {
        let client = test_client();
        let request = CompletionRequest::new("x", "m", 0.5, Mode::Continuation).unwrap();

        let json = serde_json::to_value(client.build_request_body(&request)).unwrap();

        assert_eq!(json["model"], "m");
        assert_eq!(json["max_tokens"], 1750);
        assert_eq!(json["n"], 1);
        assert!(json["messages"].is_array());
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  hello  "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.trim(), "hello");
    }
}

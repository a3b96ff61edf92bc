use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    error::{Result, TravelError},
    types::result::{GeneratedText, TokenUsage},
};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-pro-1.5";
const MAX_RETRIES: usize = 3;

/// Sampling parameters sent with every prompt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// A hosted text-in/text-out model.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate a completion for a single prompt
    async fn generate_text(&self, prompt: &str, config: &GenerationConfig)
        -> Result<GeneratedText>;
}

/// OpenAI-compatible chat completions client (OpenRouter by default)
#[derive(Clone, Debug)]
pub struct GenerationClient {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Build a client from `OPENAI_API_KEY` and the optional base URL variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            TravelError::Config(
                "OPENAI_API_KEY environment variable must be set before generating plans"
                    .to_string(),
            )
        })?;
        if api_key.trim().is_empty() {
            return Err(TravelError::Config(
                "OPENAI_API_KEY environment variable is empty".to_string(),
            ));
        }

        let mut client = Self::new(api_key);
        if let Ok(base_url) =
            std::env::var("OPENAI_BASE_URL").or_else(|_| std::env::var("OPENROUTER_BASE_URL"))
        {
            client.set_base_url(base_url);
        }
        if let Ok(model) = std::env::var("TRIP_PLANNER_MODEL") {
            client.set_model(model);
        }
        Ok(client)
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| {
                TravelError::Generation(format!("Failed to build HTTP client: {err}"))
            })?;

        let mut attempt = 0;
        let mut backoff = Duration::from_millis(250);

        loop {
            let request_url = build_chat_url(&self.base_url);

            let response = client
                .post(&request_url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .header("X-Title", "trip-planner-rs")
                .json(body)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        TravelError::Timeout(format!("Generation request timed out: {err}"))
                    } else {
                        TravelError::Generation(format!("HTTP request failed: {err}"))
                    }
                })?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response.text().await.map_err(|err| {
                TravelError::Generation(format!("Failed to read response: {err}"))
            })?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    debug!(attempt, "rate limited, retrying in {:?}", retry_after_duration);
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                warn!(
                    attempts = attempt + 1,
                    model = %self.model,
                    "still rate limited after retries, giving up"
                );
                return Err(TravelError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() {
                if attempt < MAX_RETRIES {
                    debug!(attempt, %status, "server error, retrying in {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }
                warn!(attempts = attempt + 1, %status, "server errors persisted, giving up");
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                TravelError::Generation(format!("Failed to parse JSON (HTTP {status}): {err}"))
            })?;

            if !status.is_success() {
                let api_message = response_json
                    .get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or(response_text.clone());

                return Err(TravelError::Generation(format!(
                    "HTTP {} error: {}",
                    status, api_message
                )));
            }

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| error.to_string());
                return Err(TravelError::Generation(format!(
                    "API error: {}",
                    error_message
                )));
            }

            return Ok(response_json);
        }
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate_text(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedText> {
        let body = ChatCompletionRequest::new(
            self.model.clone(),
            vec![json!({ "role": "user", "content": prompt })],
        )
        .with_config(config)
        .into_value();

        let response = self.chat_completion(&body).await?;
        parse_completion(&response)
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Decode a chat completion body into generated text.
pub(crate) fn parse_completion(payload: &Value) -> Result<GeneratedText> {
    let raw = payload.to_string();
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let response: CompletionResponse = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| {
            let path = err.path().to_string();
            let location = if path.is_empty() {
                "<root>".to_string()
            } else {
                path
            };
            TravelError::Generation(format!(
                "unexpected completion response at {}: {}",
                location,
                err.inner()
            ))
        })?;

    let choice = response.choices.into_iter().next().ok_or_else(|| {
        TravelError::Generation("Completion response contained no choices".to_string())
    })?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(TravelError::Generation(
            "Response was blocked by the content filter".to_string(),
        ));
    }

    let text = choice.message.content.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(TravelError::Generation(
            "Completion response had no text content".to_string(),
        ));
    }

    Ok(GeneratedText {
        text,
        usage: response.usage,
    })
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
        }
    }

    pub fn with_config(mut self, config: &GenerationConfig) -> Self {
        self.temperature = Some(config.temperature);
        self.top_p = Some(config.top_p);
        self.top_k = Some(config.top_k);
        self.max_tokens = Some(config.max_output_tokens);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }

        if let Some(top_k) = self.top_k {
            body["top_k"] = json!(top_k);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost/chat/completions"),
            "http://localhost/chat/completions"
        );
    }

    #[test]
    fn test_request_carries_generation_config() {
        let body = ChatCompletionRequest::new("m", vec![json!({"role": "user", "content": "hi"})])
            .with_config(&GenerationConfig::default())
            .into_value();
        assert_eq!(body["model"], "m");
        assert_eq!(body["top_k"], 40);
        assert_eq!(body["max_tokens"], 8192);
        assert!(body.get("temperature").is_some());
    }

    #[test]
    fn test_parse_completion() {
        let payload = json!({
            "choices": [{"message": {"role": "assistant", "content": "Day 1"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        });
        let generated = parse_completion(&payload).unwrap();
        assert_eq!(generated.text, "Day 1");
        assert_eq!(generated.usage.unwrap().total_tokens, 5);
    }

    #[test]
    fn test_parse_completion_content_filter() {
        let payload = json!({
            "choices": [{"message": {"content": ""}, "finish_reason": "content_filter"}]
        });
        assert!(matches!(
            parse_completion(&payload),
            Err(TravelError::Generation(_))
        ));
    }

    #[test]
    fn test_parse_completion_reports_path() {
        let payload = json!({"choices": [{"message": {"content": 42}}]});
        let err = parse_completion(&payload).unwrap_err();
        assert!(err.to_string().contains("choices[0].message.content"));
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{GenerationConfig, TextGenerator};
use crate::error::GenerationError;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// OpenAI-compatible chat-completions provider. Default configuration talks
/// to Groq; any endpoint speaking the same wire format works.
pub struct ChatCompletionProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatCompletionProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let endpoint = endpoint.into();
        let model = model.into();

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Connect {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(endpoint = %endpoint, model = %model, "created chat-completion provider");

        Ok(Self {
            client,
            endpoint,
            model,
            api_key: api_key.into(),
        })
    }

    /// Groq with the API key taken from `GROQ_API_KEY`; `GROQ_MODEL`
    /// overrides the default model.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key =
            std::env::var("GROQ_API_KEY").map_err(|_| GenerationError::Connect {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                message: "GROQ_API_KEY is not set".to_string(),
            })?;
        let model =
            std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(DEFAULT_ENDPOINT, model, api_key, Duration::from_secs(60))
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned an HTML error page (CDNs/proxies sometimes do, even with 200).
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, GenerationError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(GenerationError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: format!("HTML instead of JSON (HTTP {}): {}", status, preview),
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            GenerationError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: format!("JSON parse failed (HTTP {}): {} — body: {}", status, e, preview),
            }
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionProvider {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            max_tokens = config.max_tokens,
            temperature = config.temperature,
            prompt_len = prompt.len(),
            "sending chat-completion request"
        );

        let request = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "stream": false
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::error!(endpoint = %self.endpoint, "generation request timed out");
                    GenerationError::Timeout {
                        endpoint: self.endpoint.clone(),
                    }
                } else if e.is_connect() {
                    tracing::error!(endpoint = %self.endpoint, error = %e, "connection failed");
                    GenerationError::Connect {
                        endpoint: self.endpoint.clone(),
                        message: e.to_string(),
                    }
                } else {
                    GenerationError::Connect {
                        endpoint: self.endpoint.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(endpoint = %self.endpoint, status = %status, "generation API error");
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let result: ChatCompletionResponse =
            Self::parse_json_response(response, &self.endpoint).await?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(GenerationError::EmptyCompletion)?;

        tracing::debug!(chars = content.len(), "generation response received");
        Ok(content)
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: String,
}

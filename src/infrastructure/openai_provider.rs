//! OpenAI-compatible `/chat/completions` adapter, used for both OpenAI and DeepSeek.

use crate::domain::error::{ErrorDetail, ProviderError};
use crate::domain::traits::{CompletionProvider, CompletionRequest};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AiModel {
    #[default]
    OpenAi,
    DeepSeek,
}

impl AiModel {
    pub fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI",
            Self::DeepSeek => "DEEPSEEK",
        }
    }

    pub fn model_name(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
        }
    }
}

impl FromStr for AiModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(anyhow!("unknown model: {other} (expected openai or deepseek)")),
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::DeepSeek => f.write_str("deepseek"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: String,
    model: AiModel,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: impl Into<String>, model: AiModel) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model,
            base_url: model.base_url().to_string(),
        })
    }

    /// Points the adapter at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> AiModel {
        self.model
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        ProviderError::from_http(
            self.model.label(),
            ErrorDetail {
                message: err.to_string(),
                error_type: if err.is_timeout() { "timeout" } else { "transport" }.to_string(),
                code: "unknown".to_string(),
                status: None,
            },
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        self.model.label()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: self.model.model_name(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ProviderError::from_http(
                self.model.label(),
                error_detail(status.as_u16(), &text),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::malformed(self.model.label(), format!("invalid completion body: {e}"))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Extracts `{"error":{"message","type","code"}}` from an error response body.
pub fn error_detail(status: u16, body: &str) -> ErrorDetail {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.chars().take(300).collect()
            }
        });
    let error_type = parsed
        .as_ref()
        .and_then(|e| e.error_type.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let code = parsed
        .and_then(|e| e.code)
        .map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string());

    ErrorDetail {
        message,
        error_type,
        code,
        status: Some(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ProviderErrorKind;

    #[test]
    fn model_from_str_and_endpoints() {
        assert_eq!("OpenAI".parse::<AiModel>().expect("parse"), AiModel::OpenAi);
        assert_eq!("deepseek".parse::<AiModel>().expect("parse"), AiModel::DeepSeek);
        assert!("claude".parse::<AiModel>().is_err());
        assert_eq!(AiModel::DeepSeek.base_url(), "https://api.deepseek.com/v1");
        assert_eq!(AiModel::OpenAi.model_name(), "gpt-4o-mini");
        assert_eq!(AiModel::DeepSeek.to_string(), "deepseek");
    }

    #[test]
    fn error_detail_reads_openai_error_envelope() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let detail = error_detail(429, body);
        assert_eq!(detail.message, "You exceeded your current quota");
        assert_eq!(detail.error_type, "insufficient_quota");
        assert_eq!(detail.status, Some(429));

        let err = ProviderError::from_http("OPENAI", detail);
        assert_eq!(err.kind, ProviderErrorKind::QuotaExhausted);
    }

    #[test]
    fn error_detail_tolerates_plain_bodies_and_numeric_codes() {
        let detail = error_detail(502, "Bad Gateway");
        assert_eq!(detail.message, "Bad Gateway");
        assert_eq!(detail.code, "unknown");

        let detail = error_detail(400, r#"{"error":{"message":"bad","code":400}}"#);
        assert_eq!(detail.code, "400");
        assert_eq!(detail.error_type, "unknown");

        let detail = error_detail(500, "");
        assert_eq!(detail.message, "HTTP 500");
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let provider = OpenAiCompatibleProvider::new("k", AiModel::OpenAi)
            .expect("client")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.name(), "OPENAI");
    }
}

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed taxonomy of failures at the completion-provider boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Billing or credit failure. Never retried; halts the run.
    QuotaExhausted,
    RateLimited,
    /// 5xx, timeouts and transport failures.
    Transient,
    Auth,
    InvalidRequest,
    MalformedResponse,
}

/// How the retry loop and the orchestrator treat an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    QuotaExhausted,
    RateLimited,
    Recoverable,
    Fatal,
}

impl ProviderErrorKind {
    /// Maps a raw HTTP status plus the provider's error type/code strings to a kind.
    /// `None` status means the request never produced a response.
    pub fn from_status(status: Option<u16>, error_type: &str, code: &str) -> Self {
        let names_quota = [error_type, code].iter().any(|s| {
            let s = s.to_ascii_lowercase();
            s.contains("quota") || s.contains("billing") || s.contains("credit")
        });

        match status {
            None => Self::Transient,
            Some(402) => Self::QuotaExhausted,
            Some(429) if names_quota => Self::QuotaExhausted,
            Some(429) => Self::RateLimited,
            Some(401) | Some(403) => Self::Auth,
            Some(408) => Self::Transient,
            Some(s) if s >= 500 => Self::Transient,
            Some(_) => Self::InvalidRequest,
        }
    }

    pub fn retry_class(self) -> RetryClass {
        match self {
            Self::QuotaExhausted => RetryClass::QuotaExhausted,
            Self::RateLimited => RetryClass::RateLimited,
            Self::Transient => RetryClass::Recoverable,
            Self::Auth | Self::InvalidRequest | Self::MalformedResponse => RetryClass::Fatal,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::QuotaExhausted => "quota exhausted",
            Self::RateLimited => "rate limited",
            Self::Transient => "transient provider error",
            Self::Auth => "authentication failed",
            Self::InvalidRequest => "invalid request",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub error_type: String,
    pub code: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider} API error ({kind}): {}", self.user_message())]
pub struct ProviderError {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub detail: ErrorDetail,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind, detail: ErrorDetail) -> Self {
        Self {
            provider: provider.into(),
            kind,
            detail,
        }
    }

    /// Builds an error from an HTTP-level failure, classifying it by status and code.
    pub fn from_http(provider: impl Into<String>, detail: ErrorDetail) -> Self {
        let kind = ProviderErrorKind::from_status(detail.status, &detail.error_type, &detail.code);
        Self::new(provider, kind, detail)
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::MalformedResponse,
            ErrorDetail {
                message: message.into(),
                error_type: "malformed_response".to_string(),
                code: "unknown".to_string(),
                status: None,
            },
        )
    }

    pub fn retry_class(&self) -> RetryClass {
        self.kind.retry_class()
    }

    pub fn is_quota_exhausted(&self) -> bool {
        self.kind == ProviderErrorKind::QuotaExhausted
    }

    /// Errors after which no further remote call can succeed in this run.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::QuotaExhausted | ProviderErrorKind::Auth
        )
    }

    fn user_message(&self) -> &str {
        if self.detail.status == Some(402) {
            "Insufficient balance. Please check your account credits."
        } else {
            &self.detail.message
        }
    }
}

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::utils::constants::BODY_SNIPPET_MAX;

/// Errors surfaced by the token cache.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// Bad credential input or an out-of-range setting. Raised synchronously
    /// at construction or lookup time and never retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A refresh attempt against the token endpoint failed. The cached
    /// record is left untouched, so the next call starts a new attempt.
    #[error(transparent)]
    TokenExchange(#[from] ExchangeFailure),
}

/// Diagnostic detail for one failed exchange attempt.
///
/// Cloneable so a single attempt's failure can be handed to every caller
/// that waited on it.
#[derive(Debug, Clone)]
pub struct ExchangeFailure {
    /// Full URL the exchange was sent to.
    pub endpoint: String,
    /// HTTP status, when a response arrived at all.
    pub status: Option<StatusCode>,
    /// `Content-Type` of the response, when present.
    pub content_type: Option<String>,
    /// Response body, truncated to a diagnostic snippet.
    pub body: Option<String>,
    /// What went wrong, wrapping the underlying cause.
    pub detail: String,
}

impl ExchangeFailure {
    pub(crate) fn transport(endpoint: &str, cause: &reqwest::Error) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: None,
            content_type: None,
            body: None,
            detail: format!("transport error: {cause}"),
        }
    }

    pub(crate) fn rejected(
        endpoint: &str,
        status: StatusCode,
        content_type: Option<String>,
        body: String,
    ) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: Some(status),
            content_type,
            body: Some(snippet(body)),
            detail: "token endpoint rejected the request".to_owned(),
        }
    }

    pub(crate) fn decode(
        endpoint: &str,
        status: StatusCode,
        content_type: Option<String>,
        body: String,
        cause: &serde_json::Error,
    ) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: Some(status),
            content_type,
            body: Some(snippet(body)),
            detail: format!("undecodable response body: {cause}"),
        }
    }
}

impl fmt::Display for ExchangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token exchange with {} failed", self.endpoint)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(content_type) = &self.content_type {
            write!(f, " [{content_type}]")?;
        }
        write!(f, ": {}", self.detail)?;
        match &self.body {
            Some(body) if !body.is_empty() => write!(f, "; response body: {body}"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for ExchangeFailure {}

fn snippet(mut body: String) -> String {
    if body.len() > BODY_SNIPPET_MAX {
        let mut cut = BODY_SNIPPET_MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

//! Error types for the `esp-client` crate.
//!
//! Follows the same pattern as `domain::error`: a root `Error` struct holding an
//! error kind and an optional source for chaining. Adapter errors are always
//! tagged with the provider that produced them.

use reqwest::StatusCode;
use std::error::Error as StdError;
use std::fmt;

use crate::provider::Provider;

#[derive(Debug)]
pub struct Error {
    /// `None` only for failures raised before a provider was known.
    pub provider: Option<Provider>,
    pub error_kind: ErrorKind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Every failure an adapter or the factory can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Upstream rejected the credentials (401).
    Unauthorized,
    /// Upstream resource does not exist (404).
    NotFound,
    /// Upstream throttled the account (429).
    RateLimited,
    /// No response within the per-request timeout.
    Timeout,
    /// No response at all: DNS, connect or TLS failure.
    ServiceUnavailable,
    /// Any other upstream failure, including undecodable response bodies.
    Provider { status: u16, message: Option<String> },
    /// Provider name outside the supported set.
    UnsupportedProvider(String),
    /// API key does not have the shape the provider issues.
    InvalidKeyFormat,
    /// Mailchimp key without a data-center suffix.
    MissingRegion,
    /// The HTTP client could not be constructed.
    ClientBuild,
}

impl Error {
    pub(crate) fn new(provider: Provider, error_kind: ErrorKind) -> Self {
        Error {
            provider: Some(provider),
            error_kind,
            source: None,
        }
    }

    /// Translates a non-success upstream response.
    pub(crate) fn from_status(provider: Provider, status: StatusCode, body: &str) -> Self {
        let error_kind = match status {
            StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
            _ => ErrorKind::Provider {
                status: status.as_u16(),
                message: upstream_message(body),
            },
        };

        Error {
            provider: Some(provider),
            error_kind,
            source: None,
        }
    }

    /// Translates a request that never produced a response.
    pub(crate) fn from_transport(provider: Provider, err: reqwest_middleware::Error) -> Self {
        let error_kind = match &err {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => ErrorKind::Timeout,
            _ => ErrorKind::ServiceUnavailable,
        };

        Error {
            provider: Some(provider),
            error_kind,
            source: Some(Box::new(err)),
        }
    }

    /// Translates a response body that did not match the expected shape.
    pub(crate) fn from_decode(provider: Provider, err: reqwest::Error) -> Self {
        let error_kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else {
            ErrorKind::Provider {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: Some(format!("Invalid response from {provider}")),
            }
        };

        Error {
            provider: Some(provider),
            error_kind,
            source: Some(Box::new(err)),
        }
    }

    /// Short, user-presentable description of the failure.
    pub fn message(&self) -> String {
        let provider = self
            .provider
            .map(|p| p.display_name())
            .unwrap_or("ESP");

        match &self.error_kind {
            ErrorKind::Unauthorized => format!("{provider} rejected the API key"),
            ErrorKind::NotFound => format!("{provider} resource not found"),
            ErrorKind::RateLimited => format!("{provider} rate limit exceeded"),
            ErrorKind::Timeout => format!("{provider} did not respond in time"),
            ErrorKind::ServiceUnavailable => format!("{provider} is unreachable"),
            ErrorKind::Provider {
                status,
                message: Some(message),
            } => format!("{provider} error ({status}): {message}"),
            ErrorKind::Provider {
                status,
                message: None,
            } => format!("{provider} error ({status})"),
            ErrorKind::UnsupportedProvider(name) => format!("Unsupported ESP provider: {name}"),
            ErrorKind::InvalidKeyFormat => format!("Invalid {provider} API key format"),
            ErrorKind::MissingRegion => {
                format!("{provider} API key is missing its data-center suffix")
            }
            ErrorKind::ClientBuild => format!("Failed to build {provider} HTTP client"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Pulls a human readable message out of an upstream error body.
///
/// Mailchimp answers with problem+json (`detail`, `title`), GetResponse with
/// `message` / `codeDescription`. Non-JSON bodies are passed through trimmed.
fn upstream_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => ["detail", "message", "codeDescription", "title"]
            .iter()
            .find_map(|field| json.get(field).and_then(|v| v.as_str()))
            .map(str::to_string),
        Err(_) => Some(body.chars().take(200).collect()),
    }
}

//! Provider specific authentication headers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, ErrorKind};
use crate::provider::Provider;

/// Authentication method for outbound requests.
///
/// - Mailchimp: `Authorization: Bearer xxx`
/// - GetResponse: `X-Auth-Token: api-key xxx`
pub enum EspAuth {
    BearerToken(SecretString),
    ApiKeyHeader {
        header_name: &'static str,
        prefix: &'static str,
        api_key: SecretString,
    },
}

impl EspAuth {
    /// Picks the authentication scheme `provider` expects.
    pub fn for_provider(provider: Provider, api_key: SecretString) -> Self {
        match provider {
            Provider::Mailchimp => EspAuth::BearerToken(api_key),
            Provider::GetResponse => EspAuth::ApiKeyHeader {
                header_name: "x-auth-token",
                prefix: "api-key",
                api_key,
            },
        }
    }

    /// Builds the default headers carried by every request. The credential
    /// header is marked sensitive so it is redacted from debug output.
    pub fn headers(&self, provider: Provider) -> Result<HeaderMap, Error> {
        let (name, value) = match self {
            EspAuth::BearerToken(token) => (
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            EspAuth::ApiKeyHeader {
                header_name,
                prefix,
                api_key,
            } => (
                HeaderName::from_static(*header_name),
                format!("{} {}", prefix, api_key.expose_secret()),
            ),
        };

        let mut header_value = HeaderValue::from_str(&value).map_err(|e| Error {
            provider: Some(provider),
            error_kind: ErrorKind::InvalidKeyFormat,
            source: Some(Box::new(e)),
        })?;
        header_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, header_value);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

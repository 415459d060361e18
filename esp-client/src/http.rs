//! Outbound HTTP client construction and the shared send/decode path.

use std::time::Duration;

use async_trait::async_trait;
use http::Extensions;
use log::*;
use reqwest::{Request, Response, Url};
use reqwest_middleware::{ClientBuilder, Middleware, Next};
use serde::de::DeserializeOwned;

use crate::auth::EspAuth;
use crate::error::{Error, ErrorKind};
use crate::provider::Provider;

/// Authenticated HTTP client with middleware.
pub type AuthenticatedClient = reqwest_middleware::ClientWithMiddleware;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout; exceeding it surfaces as `ErrorKind::Timeout`.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("esp-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logs method and URL of each request and status and URL of each response.
/// Purely observational: requests and responses pass through untouched.
pub struct RequestLogger {
    provider: Provider,
}

impl RequestLogger {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let url = req.url().clone();
        debug!("{} request: {} {}", self.provider, req.method(), url);

        let result = next.run(req, extensions).await;
        match &result {
            Ok(response) => debug!("{} response: {} {}", self.provider, response.status(), url),
            Err(e) => warn!("{} request to {} failed: {:?}", self.provider, url, e),
        }
        result
    }
}

/// Builds the client used by one adapter instance: provider authentication as
/// default headers, a fixed timeout and the request logger. No retries.
pub fn build_client(
    provider: Provider,
    auth: &EspAuth,
    config: HttpClientConfig,
) -> Result<AuthenticatedClient, Error> {
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .default_headers(auth.headers(provider)?)
        .timeout(config.timeout)
        .user_agent(config.user_agent)
        .build()
        .map_err(|e| {
            warn!("Failed to build {provider} HTTP client: {e:?}");
            Error {
                provider: Some(provider),
                error_kind: ErrorKind::ClientBuild,
                source: Some(Box::new(e)),
            }
        })?;

    Ok(ClientBuilder::new(client)
        .with(RequestLogger::new(provider))
        .build())
}

/// Parses an adapter base URL once, at construction.
pub(crate) fn parse_base_url(provider: Provider, base_url: &str) -> Result<Url, Error> {
    Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
        warn!("Invalid {provider} base URL {base_url}: {e:?}");
        Error {
            provider: Some(provider),
            error_kind: ErrorKind::ClientBuild,
            source: Some(Box::new(e)),
        }
    })
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Sends `request` and returns the response if upstream answered with success.
pub(crate) async fn send(
    provider: Provider,
    request: reqwest_middleware::RequestBuilder,
) -> Result<Response, Error> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::from_transport(provider, e))?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        warn!("{provider} API error: {status} - {body}");
        Err(Error::from_status(provider, status, &body))
    }
}

/// Decodes a successful response body as JSON.
pub(crate) async fn decode<T: DeserializeOwned>(
    provider: Provider,
    response: Response,
) -> Result<T, Error> {
    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {provider} response: {e:?}");
        Error::from_decode(provider, e)
    })
}

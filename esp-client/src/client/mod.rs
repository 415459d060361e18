//! Adapter construction and dispatch.

mod getresponse;
mod mailchimp;

use std::time::Duration;

use log::*;
use secrecy::SecretString;

use crate::error::{Error, ErrorKind};
use crate::http::HttpClientConfig;
use crate::key::extract_region;
use crate::provider::Provider;
use crate::types::{MailingList, ValidationResult};

pub use getresponse::GetResponseClient;
pub use mailchimp::MailchimpClient;

/// Placeholder in the Mailchimp base URL replaced by the account data-center.
pub const DATA_CENTER_PLACEHOLDER: &str = "{dc}";

/// Upstream locations and per-call limits shared by all adapters.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Template such as `https://{dc}.api.mailchimp.com/3.0`.
    pub mailchimp_base_url: String,
    pub getresponse_base_url: String,
    pub timeout: Duration,
    /// Records requested per page when listing.
    pub page_size: u32,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            mailchimp_base_url: "https://{dc}.api.mailchimp.com/3.0".to_string(),
            getresponse_base_url: "https://api.getresponse.com/v3".to_string(),
            timeout: Duration::from_secs(30),
            page_size: 1000,
        }
    }
}

impl Endpoints {
    pub(crate) fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.timeout,
            ..HttpClientConfig::default()
        }
    }
}

/// A connected adapter for one provider account.
pub enum EspClient {
    Mailchimp(MailchimpClient),
    GetResponse(GetResponseClient),
}

impl EspClient {
    pub fn provider(&self) -> Provider {
        match self {
            EspClient::Mailchimp(_) => Provider::Mailchimp,
            EspClient::GetResponse(_) => Provider::GetResponse,
        }
    }

    /// Makes exactly one authenticated request. Never fails: transport and
    /// upstream errors are folded into an invalid result.
    pub async fn validate_connection(&self) -> ValidationResult {
        match self {
            EspClient::Mailchimp(client) => client.validate_connection().await,
            EspClient::GetResponse(client) => client.validate_connection().await,
        }
    }

    /// Every list on the account, across all pages.
    pub async fn get_lists(&self) -> Result<Vec<MailingList>, Error> {
        match self {
            EspClient::Mailchimp(client) => client.get_lists().await,
            EspClient::GetResponse(client) => client.get_lists().await,
        }
    }

    pub async fn get_list_by_id(&self, list_id: &str) -> Result<MailingList, Error> {
        match self {
            EspClient::Mailchimp(client) => client.get_list_by_id(list_id).await,
            EspClient::GetResponse(client) => client.get_list_by_id(list_id).await,
        }
    }
}

/// Builds the adapter for `provider`.
///
/// Mailchimp needs a data-center: the explicit `region` wins, otherwise it is
/// taken from the key suffix.
pub fn create_client(
    provider: Provider,
    api_key: &str,
    region: Option<&str>,
    endpoints: &Endpoints,
) -> Result<EspClient, Error> {
    let secret = SecretString::new(api_key.to_string());

    match provider {
        Provider::Mailchimp => {
            let region = match region {
                Some(region) if !region.is_empty() => region.to_string(),
                _ => extract_region(api_key).ok_or_else(|| {
                    warn!("Mailchimp API key has no data-center suffix");
                    Error::new(provider, ErrorKind::MissingRegion)
                })?,
            };

            if !region.chars().all(|c| c.is_ascii_alphanumeric()) {
                warn!("Mailchimp data-center is not alphanumeric");
                return Err(Error::new(provider, ErrorKind::InvalidKeyFormat));
            }

            let base_url = endpoints
                .mailchimp_base_url
                .replace(DATA_CENTER_PLACEHOLDER, &region);
            Ok(EspClient::Mailchimp(MailchimpClient::new(
                secret, base_url, endpoints,
            )?))
        }
        Provider::GetResponse => Ok(EspClient::GetResponse(GetResponseClient::new(
            secret,
            endpoints.getresponse_base_url.clone(),
            endpoints,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAILCHIMP_KEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-us10";

    #[test]
    fn mailchimp_region_is_taken_from_the_key() {
        let client = create_client(Provider::Mailchimp, MAILCHIMP_KEY, None, &Endpoints::default())
            .unwrap();

        match client {
            EspClient::Mailchimp(client) => {
                assert_eq!(client.base_url(), "https://us10.api.mailchimp.com/3.0")
            }
            EspClient::GetResponse(_) => panic!("expected a Mailchimp client"),
        }
    }

    #[test]
    fn explicit_region_overrides_the_key_suffix() {
        let client = create_client(
            Provider::Mailchimp,
            MAILCHIMP_KEY,
            Some("eu2"),
            &Endpoints::default(),
        )
        .unwrap();

        match client {
            EspClient::Mailchimp(client) => {
                assert_eq!(client.base_url(), "https://eu2.api.mailchimp.com/3.0")
            }
            EspClient::GetResponse(_) => panic!("expected a Mailchimp client"),
        }
    }

    #[test]
    fn mailchimp_without_region_is_rejected() {
        let result = create_client(
            Provider::Mailchimp,
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            None,
            &Endpoints::default(),
        );

        let err = result.err().unwrap();
        assert_eq!(err.error_kind, ErrorKind::MissingRegion);
        assert_eq!(err.provider, Some(Provider::Mailchimp));
    }

    #[test]
    fn mailchimp_region_must_be_host_safe() {
        let result = create_client(
            Provider::Mailchimp,
            MAILCHIMP_KEY,
            Some("evil.example.com/"),
            &Endpoints::default(),
        );

        assert_eq!(result.err().unwrap().error_kind, ErrorKind::InvalidKeyFormat);
    }

    #[test]
    fn getresponse_ignores_region() {
        let client = create_client(
            Provider::GetResponse,
            "abcdefghijklmnopqrstuvwxyz012345",
            None,
            &Endpoints::default(),
        )
        .unwrap();

        assert_eq!(client.provider(), Provider::GetResponse);
    }
}

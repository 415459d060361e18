//! Connecting, re-testing and reading from email-service-provider accounts.
//!
//! Credentials are only ever persisted after the provider accepted them, and
//! each provider has at most one active integration at a time.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::esp_integrations::Model;
use crate::provider::EspProvider;
use crate::Id;
use chrono::Utc;
use entity_api::esp_integration;
use esp_client::{
    create_client, extract_region, validate_key_format, Endpoints, EspClient, MailingList,
    Provider, ValidationResult,
};
use futures::future::join_all;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::time::Duration;

pub use entity_api::esp_integration::Upsert as Outcome;

/// The lists of one active integration, or why they could not be fetched.
#[derive(Debug)]
pub struct IntegrationLists {
    pub integration_id: Id,
    pub provider: EspProvider,
    pub result: Result<Vec<MailingList>, esp_client::Error>,
}

/// Upstream locations and limits taken from the service configuration.
pub fn endpoints(config: &Config) -> Endpoints {
    Endpoints {
        mailchimp_base_url: config.mailchimp_base_url().to_string(),
        getresponse_base_url: config.getresponse_base_url().to_string(),
        timeout: Duration::from_secs(config.esp_request_timeout_secs),
        page_size: config.esp_page_size,
    }
}

fn client_provider(provider: EspProvider) -> Provider {
    match provider {
        EspProvider::Mailchimp => Provider::Mailchimp,
        EspProvider::GetResponse => Provider::GetResponse,
    }
}

fn entity_provider(provider: Provider) -> EspProvider {
    match provider {
        Provider::Mailchimp => EspProvider::Mailchimp,
        Provider::GetResponse => EspProvider::GetResponse,
    }
}

/// Parses an optional `?provider=` filter.
pub fn parse_provider_filter(provider: Option<&str>) -> Result<Option<EspProvider>, Error> {
    provider
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.parse::<Provider>().map(entity_provider))
        .transpose()
        .map_err(Error::from)
}

fn client_for(integration: &Model, endpoints: &Endpoints) -> Result<EspClient, esp_client::Error> {
    create_client(
        client_provider(integration.provider),
        &integration.api_key,
        integration.region.as_deref(),
        endpoints,
    )
}

/// Validates `api_key` against `provider` and stores it as that provider's
/// active integration, replacing any previous credentials.
///
/// Malformed input is rejected before any network call. Credentials the
/// provider does not accept are never persisted.
pub async fn create_or_update(
    db: &DatabaseConnection,
    config: &Config,
    provider: &str,
    api_key: &str,
) -> Result<(Model, Outcome), Error> {
    let provider: Provider = provider.parse()?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(Error::validation("API key is required"));
    }

    let region = match provider {
        Provider::Mailchimp => Some(extract_region(api_key).ok_or_else(|| {
            warn!("Rejected Mailchimp API key without data-center suffix");
            Error::validation("Mailchimp API key must end with a data-center suffix, e.g. -us10")
        })?),
        Provider::GetResponse => None,
    };

    if !validate_key_format(provider, api_key) {
        warn!("Rejected {provider} API key with invalid format");
        return Err(Error::validation(format!(
            "Invalid {provider} API key format"
        )));
    }

    let client = create_client(provider, api_key, region.as_deref(), &endpoints(config))?;
    let validation = client.validate_connection().await;
    if !validation.is_valid {
        let reason = validation
            .error
            .unwrap_or_else(|| format!("{provider} rejected the API key"));
        warn!("{provider} credentials failed validation: {reason}");
        return Err(Error {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::Unauthenticated(reason)),
        });
    }

    let (integration, outcome) = esp_integration::upsert_active(
        db,
        entity_provider(provider),
        api_key.to_string(),
        region,
        Utc::now(),
    )
    .await?;

    info!(
        "{provider} integration {} {:?}",
        integration.id, outcome
    );
    Ok((integration, outcome))
}

/// Active integrations, optionally narrowed to one provider.
pub async fn find_active(
    db: &DatabaseConnection,
    provider: Option<&str>,
) -> Result<Vec<Model>, Error> {
    let provider = parse_provider_filter(provider)?;
    Ok(esp_integration::find_active(db, provider).await?)
}

/// Fetches the lists of every active integration concurrently.
///
/// A failing provider never aborts the batch: its entry carries the error
/// instead of lists. Entry order is not significant.
pub async fn fetch_lists(
    db: &DatabaseConnection,
    config: &Config,
    provider: Option<&str>,
) -> Result<Vec<IntegrationLists>, Error> {
    let integrations = find_active(db, provider).await?;
    if integrations.is_empty() {
        debug!("No active ESP integrations to fetch lists from");
        return Err(Error::not_found());
    }

    let endpoints = endpoints(config);
    let endpoints = &endpoints;
    let fetches = integrations.into_iter().map(|integration| async move {
        let result = match client_for(&integration, endpoints) {
            Ok(client) => client.get_lists().await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(
                "Failed to fetch lists for {} integration {}: {e}",
                integration.provider, integration.id
            );
        }

        IntegrationLists {
            integration_id: integration.id,
            provider: integration.provider,
            result,
        }
    });

    Ok(join_all(fetches).await)
}

async fn find_active_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    let integration = esp_integration::find_by_id(db, id).await?;
    if !integration.is_active {
        debug!("ESP integration {id} is inactive");
        return Err(Error::not_found());
    }
    Ok(integration)
}

/// Fetches one list from an active integration.
pub async fn fetch_list(
    db: &DatabaseConnection,
    config: &Config,
    integration_id: Id,
    list_id: &str,
) -> Result<MailingList, Error> {
    let integration = find_active_by_id(db, integration_id).await?;
    let client = client_for(&integration, &endpoints(config))?;
    Ok(client.get_list_by_id(list_id).await?)
}

/// Re-validates the stored credentials of an active integration.
///
/// The outcome is returned even when recording the verification time fails.
pub async fn test(
    db: &DatabaseConnection,
    config: &Config,
    id: Id,
) -> Result<ValidationResult, Error> {
    let integration = find_active_by_id(db, id).await?;
    let client = client_for(&integration, &endpoints(config))?;

    let result = client.validate_connection().await;
    if result.is_valid {
        if let Err(e) = esp_integration::touch_verified_at(db, integration, Utc::now()).await {
            warn!("Failed to record verification time for ESP integration {id}: {e:?}");
        }
    } else {
        info!("ESP integration {id} failed re-validation");
    }

    Ok(result)
}

/// Soft-deletes an integration.
pub async fn deactivate(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    let integration = esp_integration::deactivate(db, id).await?;
    info!("Deactivated {} integration {id}", integration.provider);
    Ok(integration)
}

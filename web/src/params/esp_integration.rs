//! Parameters and response bodies for the ESP integration endpoints.

use domain::error::Error as DomainError;
use domain::esp_integration::IntegrationLists;
use domain::provider::EspProvider;
use domain::{Id, MailingList};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::controller::ApiError;
use crate::error::classify;

/// Credentials submitted to connect an ESP account. Not `Debug`: the key must
/// never end up in a log line.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    /// `mailchimp` or `getresponse`
    #[schema(example = "mailchimp")]
    pub provider: String,
    #[schema(example = "0123456789abcdef0123456789abcdef-us10")]
    pub api_key: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProviderFilter {
    /// Restrict the result to one provider
    pub provider: Option<String>,
}

/// Lists of one integration, or the error that prevented fetching them.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationListsResponse {
    #[schema(value_type = Uuid)]
    pub integration_id: Id,
    pub provider: EspProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub lists: Option<Vec<MailingList>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub error: Option<ApiError>,
}

impl From<IntegrationLists> for IntegrationListsResponse {
    fn from(group: IntegrationLists) -> Self {
        let (lists, error) = match group.result {
            Ok(lists) => (Some(lists), None),
            Err(e) => (None, Some(classify(&DomainError::from(e)).1)),
        };

        Self {
            integration_id: group.integration_id,
            provider: group.provider,
            lists,
            error,
        }
    }
}

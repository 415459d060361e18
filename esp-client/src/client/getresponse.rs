use log::*;
use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;

use super::Endpoints;
use crate::auth::EspAuth;
use crate::error::Error;
use crate::http::{self, AuthenticatedClient};
use crate::provider::Provider;
use crate::types::{AccountInfo, GetResponseAccount, MailingList, Records, ValidationResult};

const PROVIDER: Provider = Provider::GetResponse;

/// Response header carrying the page count of a collection.
const TOTAL_PAGES_HEADER: &str = "totalpages";

/// GetResponse API v3 adapter. Lists are called campaigns upstream.
pub struct GetResponseClient {
    client: AuthenticatedClient,
    base_url: Url,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Campaign {
    campaign_id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_on: Option<String>,
}

impl From<Campaign> for MailingList {
    fn from(campaign: Campaign) -> Self {
        MailingList {
            id: campaign.campaign_id,
            name: campaign.name,
            provider: PROVIDER,
            member_count: None,
            description: campaign.description.filter(|d| !d.is_empty()),
            created_at: campaign.created_on,
        }
    }
}

impl GetResponseClient {
    pub(crate) fn new(
        api_key: SecretString,
        base_url: String,
        endpoints: &Endpoints,
    ) -> Result<Self, Error> {
        let auth = EspAuth::for_provider(PROVIDER, api_key);
        Ok(Self {
            client: http::build_client(PROVIDER, &auth, endpoints.http_config())?,
            base_url: http::parse_base_url(PROVIDER, &base_url)?,
            page_size: endpoints.page_size.max(1),
        })
    }

    pub async fn validate_connection(&self) -> ValidationResult {
        match self.account().await {
            Ok(account) => {
                info!(
                    "GetResponse connection validated for account {}",
                    account.account_id
                );
                ValidationResult::valid(PROVIDER, AccountInfo::GetResponse(account))
            }
            Err(e) => {
                warn!("GetResponse connection validation failed: {e}");
                ValidationResult::invalid(PROVIDER, e.message())
            }
        }
    }

    async fn account(&self) -> Result<GetResponseAccount, Error> {
        let url = http::endpoint(&self.base_url, &["accounts"]);
        let response = http::send(PROVIDER, self.client.get(url)).await?;
        http::decode(PROVIDER, response).await
    }

    /// Walks `/campaigns` page by page. Stops at the advertised page count, or,
    /// when upstream omits it, at the first empty page.
    pub async fn get_lists(&self) -> Result<Vec<MailingList>, Error> {
        let url = http::endpoint(&self.base_url, &["campaigns"]);
        let mut lists = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = self
                .client
                .get(url.clone())
                .query(&[("perPage", self.page_size), ("page", page)]);
            let response = http::send(PROVIDER, request).await?;
            let total_pages = total_pages(&response);

            let records = http::decode::<Records<Campaign>>(PROVIDER, response)
                .await?
                .into_vec();
            let received = records.len();
            lists.extend(records.into_iter().map(MailingList::from));

            if received == 0 || total_pages.is_some_and(|total| page >= total) {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} GetResponse campaigns", lists.len());
        Ok(lists)
    }

    pub async fn get_list_by_id(&self, list_id: &str) -> Result<MailingList, Error> {
        let url = http::endpoint(&self.base_url, &["campaigns", list_id]);
        let response = http::send(PROVIDER, self.client.get(url)).await?;
        let campaign: Campaign = http::decode(PROVIDER, response).await?;
        Ok(campaign.into())
    }
}

fn total_pages(response: &reqwest::Response) -> Option<u32> {
    response
        .headers()
        .get(TOTAL_PAGES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

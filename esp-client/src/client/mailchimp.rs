use log::*;
use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;

use super::Endpoints;
use crate::auth::EspAuth;
use crate::error::Error;
use crate::http::{self, AuthenticatedClient};
use crate::provider::Provider;
use crate::types::{AccountInfo, MailchimpAccount, MailingList, Records, ValidationResult};

const PROVIDER: Provider = Provider::Mailchimp;

/// Mailchimp Marketing API v3 adapter. Lists are called audiences upstream.
pub struct MailchimpClient {
    client: AuthenticatedClient,
    base_url: Url,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct MailchimpList {
    id: String,
    name: String,
    #[serde(default)]
    stats: Option<ListStats>,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListStats {
    #[serde(default)]
    member_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListsPage {
    #[serde(default)]
    lists: Records<MailchimpList>,
    #[serde(default)]
    total_items: Option<u64>,
}

impl From<MailchimpList> for MailingList {
    fn from(list: MailchimpList) -> Self {
        MailingList {
            id: list.id,
            name: list.name,
            provider: PROVIDER,
            member_count: list.stats.and_then(|stats| stats.member_count),
            description: None,
            created_at: list.date_created,
        }
    }
}

impl MailchimpClient {
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

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn validate_connection(&self) -> ValidationResult {
        match self.account().await {
            Ok(account) => {
                info!("Mailchimp connection validated for account {}", account.account_id);
                ValidationResult::valid(PROVIDER, AccountInfo::Mailchimp(account))
            }
            Err(e) => {
                warn!("Mailchimp connection validation failed: {e}");
                ValidationResult::invalid(PROVIDER, e.message())
            }
        }
    }

    /// The API root answers with the account the key belongs to.
    async fn account(&self) -> Result<MailchimpAccount, Error> {
        let url = http::endpoint(&self.base_url, &[""]);
        let response = http::send(PROVIDER, self.client.get(url)).await?;
        http::decode(PROVIDER, response).await
    }

    pub async fn get_lists(&self) -> Result<Vec<MailingList>, Error> {
        let url = http::endpoint(&self.base_url, &["lists"]);
        let page_size = u64::from(self.page_size);
        let mut lists = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let request = self
                .client
                .get(url.clone())
                .query(&[("count", page_size), ("offset", offset)]);
            let page: ListsPage = http::decode(PROVIDER, http::send(PROVIDER, request).await?).await?;

            let records = page.lists.into_vec();
            let received = records.len() as u64;
            if received == 0 {
                break;
            }
            offset += received;
            lists.extend(records.into_iter().map(MailingList::from));

            if page.total_items.is_some_and(|total| offset >= total) {
                break;
            }
        }

        debug!("Fetched {} Mailchimp lists", lists.len());
        Ok(lists)
    }

    pub async fn get_list_by_id(&self, list_id: &str) -> Result<MailingList, Error> {
        let url = http::endpoint(&self.base_url, &["lists", list_id]);
        let response = http::send(PROVIDER, self.client.get(url)).await?;
        let list: MailchimpList = http::decode(PROVIDER, response).await?;
        Ok(list.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    const API_KEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-us10";

    fn client(base_url: String, page_size: u32) -> MailchimpClient {
        let endpoints = Endpoints {
            mailchimp_base_url: base_url.clone(),
            page_size,
            timeout: Duration::from_secs(5),
            ..Endpoints::default()
        };
        MailchimpClient::new(SecretString::new(API_KEY.to_string()), base_url, &endpoints)
            .unwrap()
    }

    #[tokio::test]
    async fn validate_connection_returns_account_info() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("authorization", format!("Bearer {API_KEY}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "account_id": "8d3a3db4d97663a9074efcc16",
                    "account_name": "Acme",
                    "email": "owner@acme.test",
                    "total_subscribers": 42
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let result = client(server.url(), 1000).validate_connection().await;

        assert!(result.is_valid);
        assert_eq!(result.provider, Provider::Mailchimp);
        match result.account_info {
            Some(AccountInfo::Mailchimp(account)) => {
                assert_eq!(account.account_id, "8d3a3db4d97663a9074efcc16");
                assert_eq!(account.total_subscribers, Some(42));
            }
            other => panic!("unexpected account info: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn validate_connection_reports_rejected_keys() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(401)
            .with_body(r#"{"title":"API Key Invalid","status":401,"detail":"Your API key may be invalid"}"#)
            .create_async()
            .await;

        let result = client(server.url(), 1000).validate_connection().await;

        assert!(!result.is_valid);
        assert!(result.account_info.is_none());
        assert_eq!(result.error.as_deref(), Some("Mailchimp rejected the API key"));
    }

    #[tokio::test]
    async fn get_lists_follows_pagination_until_total_items() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/lists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("count".into(), "2".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "lists": [
                        {"id": "l1", "name": "Newsletter", "stats": {"member_count": 10}},
                        {"id": "l2", "name": "Customers", "stats": {"member_count": 5}}
                    ],
                    "total_items": 3
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/lists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("count".into(), "2".into()),
                Matcher::UrlEncoded("offset".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "lists": [{"id": "l3", "name": "Leads", "date_created": "2024-01-01T00:00:00+00:00"}],
                    "total_items": 3
                })
                .to_string(),
            )
            .create_async()
            .await;

        let lists = client(server.url(), 2).get_lists().await.unwrap();

        let ids: Vec<&str> = lists.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
        assert_eq!(lists[0].member_count, Some(10));
        assert_eq!(lists[2].member_count, None);
        assert_eq!(lists[2].created_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert!(lists.iter().all(|l| l.provider == Provider::Mailchimp));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn get_lists_without_total_items_pages_until_empty() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/lists")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(json!({"lists": [{"id": "l1", "name": "Newsletter"}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/lists")
            .match_query(Matcher::UrlEncoded("offset".into(), "1".into()))
            .with_status(200)
            .with_body(json!({"lists": [{"id": "l2", "name": "Customers"}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let last = server
            .mock("GET", "/lists")
            .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
            .with_status(200)
            .with_body(json!({"lists": []}).to_string())
            .expect(1)
            .create_async()
            .await;

        // Upstream caps the page below the requested count
        let lists = client(server.url(), 10).get_lists().await.unwrap();

        let ids: Vec<&str> = lists.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
        first.assert_async().await;
        second.assert_async().await;
        last.assert_async().await;
    }

    #[tokio::test]
    async fn get_lists_accepts_keyed_records() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/lists")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "lists": {"l1": {"id": "l1", "name": "Newsletter"}},
                    "total_items": 1
                })
                .to_string(),
            )
            .create_async()
            .await;

        let lists = client(server.url(), 1000).get_lists().await.unwrap();

        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Newsletter");
    }

    #[tokio::test]
    async fn get_lists_maps_rate_limiting() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/lists")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = client(server.url(), 1000).get_lists().await.unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::RateLimited);
        assert_eq!(err.provider, Some(Provider::Mailchimp));
    }

    #[tokio::test]
    async fn get_list_by_id_maps_missing_lists_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/lists/missing")
            .with_status(404)
            .with_body(r#"{"title":"Resource Not Found","status":404}"#)
            .create_async()
            .await;

        let err = client(server.url(), 1000)
            .get_list_by_id("missing")
            .await
            .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn get_list_by_id_returns_the_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/lists/l1")
            .with_status(200)
            .with_body(json!({"id": "l1", "name": "Newsletter", "stats": {"member_count": 7}}).to_string())
            .create_async()
            .await;

        let list = client(server.url(), 1000).get_list_by_id("l1").await.unwrap();

        assert_eq!(list.id, "l1");
        assert_eq!(list.member_count, Some(7));
    }
}

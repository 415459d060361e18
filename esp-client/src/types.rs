//! Provider-independent shapes returned by every adapter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::provider::Provider;

/// Outcome of a live credential check. Never an error: an unusable key is
/// reported as `is_valid == false` with a reason in `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,
}

impl ValidationResult {
    pub fn valid(provider: Provider, account_info: AccountInfo) -> Self {
        Self {
            is_valid: true,
            provider,
            error: None,
            account_info: Some(account_info),
        }
    }

    pub fn invalid(provider: Provider, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            provider,
            error: Some(error.into()),
            account_info: None,
        }
    }
}

/// Account details as reported by the provider, field names kept as upstream
/// sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountInfo {
    Mailchimp(MailchimpAccount),
    GetResponse(GetResponseAccount),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailchimpAccount {
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_subscribers: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseAccount {
    pub account_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// A mailing list (Mailchimp audience, GetResponse campaign).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingList {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A collection that upstream may send either as a JSON array or as an object
/// keyed by record id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Records<T> {
    Sequence(Vec<T>),
    Keyed(BTreeMap<String, T>),
}

impl<T> Records<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Records::Sequence(items) => items,
            Records::Keyed(map) => map.into_values().collect(),
        }
    }
}

impl<T> Default for Records<T> {
    fn default() -> Self {
        Records::Sequence(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_records_normalize_to_a_sequence() {
        let records: Records<String> =
            serde_json::from_value(json!({"b": "second", "a": "first"})).unwrap();
        assert_eq!(records.into_vec(), vec!["first", "second"]);

        let records: Records<String> = serde_json::from_value(json!(["x", "y"])).unwrap();
        assert_eq!(records.into_vec(), vec!["x", "y"]);
    }

    #[test]
    fn invalid_results_omit_account_info() {
        let json = serde_json::to_value(ValidationResult::invalid(
            Provider::Mailchimp,
            "Mailchimp rejected the API key",
        ))
        .unwrap();

        assert_eq!(
            json,
            json!({
                "isValid": false,
                "provider": "mailchimp",
                "error": "Mailchimp rejected the API key"
            })
        );
    }

    #[test]
    fn account_info_passes_upstream_fields_through() {
        let info = AccountInfo::GetResponse(GetResponseAccount {
            account_id: "abc".to_string(),
            email: Some("owner@example.com".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: None,
            company_name: None,
        });

        let json = serde_json::to_value(ValidationResult::valid(Provider::GetResponse, info))
            .unwrap();
        assert_eq!(json["accountInfo"]["accountId"], "abc");
        assert_eq!(json["accountInfo"]["firstName"], "Ada");
        assert_eq!(json["isValid"], true);
    }
}

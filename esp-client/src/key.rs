//! Syntactic API key checks. Pure functions: nothing here touches the network,
//! so malformed keys are rejected before any request is built.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::provider::Provider;

/// Mailchimp keys are a 32 character hex secret followed by the data-center,
/// e.g. `0123456789abcdef0123456789abcdef-us10`.
static MAILCHIMP_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{32}-[a-z]{2,}[0-9]+$").expect("Mailchimp key pattern is valid")
});

/// Shortest GetResponse key accepted.
pub const GETRESPONSE_MIN_KEY_LENGTH: usize = 32;

/// Returns the data-center suffix of a Mailchimp style `<secret>-<region>` key.
///
/// The key must split on `-` into exactly two non-empty parts; anything else
/// yields `None` and the caller is expected to fail rather than guess.
pub fn extract_region(api_key: &str) -> Option<String> {
    let mut parts = api_key.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(secret), Some(region), None) if !secret.is_empty() && !region.is_empty() => {
            Some(region.to_string())
        }
        _ => None,
    }
}

/// Checks whether `api_key` has the shape `provider` issues keys in.
pub fn validate_key_format(provider: Provider, api_key: &str) -> bool {
    match provider {
        Provider::Mailchimp => MAILCHIMP_KEY.is_match(api_key),
        Provider::GetResponse => {
            api_key.len() >= GETRESPONSE_MIN_KEY_LENGTH
                && api_key.chars().all(|c| c.is_ascii_alphanumeric())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn extract_region_returns_suffix_of_well_formed_keys() {
        for region in ["us1", "us10", "eu2"] {
            let key = format!("{HEX_SECRET}-{region}");
            assert_eq!(extract_region(&key).as_deref(), Some(region));
        }
    }

    #[test]
    fn extract_region_requires_exactly_one_separator() {
        assert_eq!(extract_region(HEX_SECRET), None);
        assert_eq!(extract_region(&format!("{HEX_SECRET}-us10-extra")), None);
        assert_eq!(extract_region(&format!("{HEX_SECRET}-")), None);
        assert_eq!(extract_region("-us10"), None);
        assert_eq!(extract_region(""), None);
    }

    #[test]
    fn mailchimp_keys_need_hex_secret_and_region() {
        assert!(validate_key_format(
            Provider::Mailchimp,
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-us10"
        ));
        assert!(validate_key_format(
            Provider::Mailchimp,
            &format!("{}-us6", HEX_SECRET.to_uppercase())
        ));

        // wrong length
        assert!(!validate_key_format(Provider::Mailchimp, "abcdef-us10"));
        // not hex
        assert!(!validate_key_format(
            Provider::Mailchimp,
            "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz-us10"
        ));
        // no region
        assert!(!validate_key_format(Provider::Mailchimp, HEX_SECRET));
        assert!(!validate_key_format(
            Provider::Mailchimp,
            &format!("{HEX_SECRET}-10")
        ));
    }

    #[test]
    fn getresponse_keys_need_length_and_alphanumerics() {
        assert!(validate_key_format(
            Provider::GetResponse,
            "abcdefghijklmnopqrstuvwxyz012345"
        ));
        assert!(!validate_key_format(Provider::GetResponse, "short"));
        assert!(!validate_key_format(
            Provider::GetResponse,
            "abcdefghijklmnop-rstuvwxyz0123456"
        ));
    }
}

//! # esp-client
//!
//! Uniform access to the mailing lists of the supported email-service-providers:
//! - Mailchimp: data-center suffixed API keys, bearer authentication
//! - GetResponse: `X-Auth-Token` header authentication
//!
//! Every adapter exposes the same three operations (`validate_connection`,
//! `get_lists`, `get_list_by_id`) and translates every upstream failure into
//! one provider-tagged [`Error`] before it leaves this crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use esp_client::{create_client, Endpoints, Provider};
//!
//! let provider: Provider = "mailchimp".parse()?;
//! let client = create_client(provider, api_key, None, &endpoints)?;
//! let result = client.validate_connection().await;
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod key;
pub mod provider;
pub mod types;

// Re-export commonly used types
pub use client::{create_client, Endpoints, EspClient};
pub use error::{Error, ErrorKind};
pub use key::{extract_region, validate_key_format};
pub use provider::Provider;
pub use types::{AccountInfo, MailingList, ValidationResult};

//! The closed set of supported email-service-providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Mailchimp,
    GetResponse,
}

impl Provider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mailchimp => "mailchimp",
            Provider::GetResponse => "getresponse",
        }
    }

    /// Human readable name used in log lines and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Mailchimp => "Mailchimp",
            Provider::GetResponse => "GetResponse",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mailchimp" => Ok(Provider::Mailchimp),
            "getresponse" => Ok(Provider::GetResponse),
            _ => Err(Error {
                provider: None,
                error_kind: ErrorKind::UnsupportedProvider(s.to_string()),
                source: None,
            }),
        }
    }
}

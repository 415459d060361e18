use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The email-service-providers a stored integration can belong to.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "esp_provider")]
pub enum EspProvider {
    #[sea_orm(string_value = "mailchimp")]
    Mailchimp,
    #[sea_orm(string_value = "getresponse")]
    GetResponse,
}

impl EspProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mailchimp => "mailchimp",
            Self::GetResponse => "getresponse",
        }
    }

    /// Human readable name used in log lines and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mailchimp => "Mailchimp",
            Self::GetResponse => "GetResponse",
        }
    }
}

impl std::fmt::Display for EspProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

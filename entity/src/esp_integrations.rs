//! SeaORM Entity for the esp_integrations table.
//! One row per stored ESP credential; at most one active row per provider.

use crate::{provider::EspProvider, Id};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = entity::esp_integrations::Model)]
#[sea_orm(schema_name = "esp_integrations", table_name = "esp_integrations")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,

    pub provider: EspProvider,

    /// Never leaves the service: skipped by every serialized representation.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub api_key: String,

    /// Mailchimp data-center (e.g. `us10`), derived from the API key suffix
    pub region: Option<String>,

    pub is_active: bool,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_verified_at: Option<DateTimeWithTimeZone>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Persistence operations for the esp_integrations table.
//!
//! Rows are never hard-deleted: deactivation flips `is_active`, and every
//! write that targets "the" integration for a provider goes through the
//! currently active row.

use super::error::{EntityApiErrorKind, Error};
use chrono::{DateTime, Utc};
use entity::esp_integrations::{ActiveModel, Column, Entity, Model};
use entity::provider::EspProvider;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, DatabaseConnection, QueryOrder,
    TransactionTrait,
};

/// Whether an upsert inserted a new active row or rewrote the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Inserts a new active integration.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    provider: EspProvider,
    api_key: String,
    region: Option<String>,
    verified_at: DateTime<Utc>,
) -> Result<Model, Error> {
    debug!("Creating new {provider} integration");

    let now = Utc::now();

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        provider: Set(provider),
        api_key: Set(api_key),
        region: Set(region),
        is_active: Set(true),
        last_verified_at: Set(Some(verified_at.into())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Finds an integration by ID, active or not.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        debug!("ESP integration with id {id} not found");
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    })
}

/// Finds the single active integration for `provider`, if any.
pub async fn find_active_by_provider<C: ConnectionTrait>(
    db: &C,
    provider: EspProvider,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Provider.eq(provider))
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

/// Finds all active integrations, optionally narrowed to one provider.
pub async fn find_active(
    db: &DatabaseConnection,
    provider: Option<EspProvider>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::IsActive.eq(true));
    if let Some(provider) = provider {
        query = query.filter(Column::Provider.eq(provider));
    }

    Ok(query.order_by_asc(Column::CreatedAt).all(db).await?)
}

/// Stores freshly verified credentials for `provider`.
///
/// The lookup of the current active row and the following update or insert
/// run in one transaction, so a provider never ends up with two active rows
/// from this path. The partial unique index on `(provider) WHERE is_active`
/// rejects anything that still races past it.
pub async fn upsert_active(
    db: &DatabaseConnection,
    provider: EspProvider,
    api_key: String,
    region: Option<String>,
    verified_at: DateTime<Utc>,
) -> Result<(Model, Upsert), Error> {
    let txn = db.begin().await?;

    let result = match find_active_by_provider(&txn, provider).await? {
        Some(existing) => {
            debug!("Updating active {provider} integration: {}", existing.id);

            let mut active_model: ActiveModel = existing.into();
            active_model.api_key = Set(api_key);
            active_model.region = Set(region);
            active_model.last_verified_at = Set(Some(verified_at.into()));
            active_model.updated_at = Set(Utc::now().into());

            (active_model.update(&txn).await?, Upsert::Updated)
        }
        None => (
            create(&txn, provider, api_key, region, verified_at).await?,
            Upsert::Created,
        ),
    };

    txn.commit().await?;
    Ok(result)
}

/// Records a successful live validation of `model`'s credentials.
pub async fn touch_verified_at(
    db: &DatabaseConnection,
    model: Model,
    verified_at: DateTime<Utc>,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = model.into();
    active_model.last_verified_at = Set(Some(verified_at.into()));
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

/// Soft-deletes an integration by clearing its active flag.
pub async fn deactivate(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    debug!("Deactivating {} integration: {id}", existing.provider);

    let mut active_model: ActiveModel = existing.into();
    active_model.is_active = Set(false);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn integration(provider: EspProvider, is_active: bool) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            provider,
            api_key: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-us10".to_string(),
            region: Some("us10".to_string()),
            is_active,
            last_verified_at: Some(now.into()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn upsert_active_creates_when_provider_has_no_active_row() -> Result<(), Error> {
        let created = integration(EspProvider::Mailchimp, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .append_query_results(vec![vec![created.clone()]])
            .into_connection();

        let (model, outcome) = upsert_active(
            &db,
            EspProvider::Mailchimp,
            created.api_key.clone(),
            Some("us10".to_string()),
            Utc::now(),
        )
        .await?;

        assert_eq!(outcome, Upsert::Created);
        assert_eq!(model.id, created.id);
        assert!(model.is_active);
        assert!(model.last_verified_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn upsert_active_rewrites_the_existing_active_row() -> Result<(), Error> {
        let existing = integration(EspProvider::Mailchimp, true);
        let mut updated = existing.clone();
        updated.api_key = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb-us21".to_string();
        updated.region = Some("us21".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![existing.clone()]])
            .append_query_results(vec![vec![updated.clone()]])
            .into_connection();

        let (model, outcome) = upsert_active(
            &db,
            EspProvider::Mailchimp,
            updated.api_key.clone(),
            updated.region.clone(),
            Utc::now(),
        )
        .await?;

        assert_eq!(outcome, Upsert::Updated);
        assert_eq!(model.id, existing.id);
        assert_eq!(model.region.as_deref(), Some("us21"));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("UPDATE"));
        assert!(!log.contains("INSERT"));
        Ok(())
    }

    #[tokio::test]
    async fn find_active_filters_on_active_flag_and_provider() -> Result<(), Error> {
        let row = integration(EspProvider::GetResponse, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row.clone()]])
            .into_connection();

        let rows = find_active(&db, Some(EspProvider::GetResponse)).await?;
        assert_eq!(rows, vec![row]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("is_active"));
        assert!(log.contains("provider"));
        Ok(())
    }

    #[tokio::test]
    async fn deactivate_clears_the_active_flag() -> Result<(), Error> {
        let existing = integration(EspProvider::GetResponse, true);
        let mut deactivated = existing.clone();
        deactivated.is_active = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![existing.clone()]])
            .append_query_results(vec![vec![deactivated]])
            .into_connection();

        let model = deactivate(&db, existing.id).await?;

        assert_eq!(model.id, existing.id);
        assert!(!model.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn deactivate_returns_not_found_for_unknown_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = deactivate(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}

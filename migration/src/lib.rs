pub use sea_orm_migration::prelude::*;

use sea_orm_migration::sea_orm::DatabaseConnection;

mod m20261019_000001_create_schema;
mod m20261019_000002_create_esp_integrations;

/// Postgres schema owning every table of the service, `seaql_migrations` included.
pub const SCHEMA: &str = "esp_integrations";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_schema::Migration),
            Box::new(m20261019_000002_create_esp_integrations::Migration),
        ]
    }
}

/// Creates the service schema if it is missing. Pool connections search only
/// this schema, so it has to exist before the migrator creates its own table.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    db.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {SCHEMA};"))
        .await?;
    Ok(())
}

/// Brings a possibly empty database up to the latest migration.
pub async fn run(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_schema(db).await?;
    Migrator::up(db, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Statement, Transaction};

    #[tokio::test]
    async fn create_schema_issues_an_idempotent_create() -> Result<(), DbErr> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        create_schema(&db).await?;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::one(Statement::from_string(
                DatabaseBackend::Postgres,
                "CREATE SCHEMA IF NOT EXISTS esp_integrations;",
            ))]
        );
        Ok(())
    }

    #[test]
    fn schema_matches_the_connection_search_path() {
        assert_eq!(SCHEMA, service::DB_SCHEMA);
    }
}

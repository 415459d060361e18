use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "DO $$ BEGIN
                CREATE TYPE esp_integrations.esp_provider AS ENUM ('mailchimp', 'getresponse');
            EXCEPTION
                WHEN duplicate_object THEN null;
            END $$;",
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS esp_integrations.esp_integrations (
                id UUID PRIMARY KEY,
                provider esp_integrations.esp_provider NOT NULL,
                api_key TEXT NOT NULL,
                region VARCHAR(32),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                last_verified_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .await?;

        // At most one active integration per provider
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_esp_integrations_active_provider
             ON esp_integrations.esp_integrations(provider)
             WHERE is_active",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS esp_integrations.esp_integrations")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS esp_integrations.esp_provider")
            .await?;

        Ok(())
    }
}

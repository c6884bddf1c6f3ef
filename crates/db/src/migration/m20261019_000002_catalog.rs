//! Contact activity flag and the item catalog.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CONTACTS_ACTIVE_SQL).await?;
        db.execute_unprepared(ITEMS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const CONTACTS_ACTIVE_SQL: &str = r"
ALTER TABLE contacts ADD COLUMN is_active BOOLEAN NOT NULL DEFAULT TRUE;
";

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    description TEXT,
    rate NUMERIC(15, 2) NOT NULL DEFAULT 0,
    unit VARCHAR(50) NOT NULL DEFAULT 'qty',
    tax_rate NUMERIC(5, 2) NOT NULL DEFAULT 0,
    group_name VARCHAR(100) NOT NULL DEFAULT 'General',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_items_rate CHECK (rate >= 0),
    CONSTRAINT chk_items_tax_rate CHECK (tax_rate BETWEEN 0 AND 100)
);

CREATE INDEX idx_items_group_name ON items(group_name, name);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS items CASCADE;
ALTER TABLE contacts DROP COLUMN IF EXISTS is_active;
";

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_core_tables;
mod m20250601_000002_create_billing_tables;
mod m20250601_000003_create_usage_tables;

/// Database migrator for SeaORM
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_core_tables::Migration),
            Box::new(m20250601_000002_create_billing_tables::Migration),
            Box::new(m20250601_000003_create_usage_tables::Migration),
        ]
    }
}

//! Usage tables migration: usage_events, usage_snapshots, quota_limits

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsageEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UsageEvents::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(UsageEvents::TenantId).uuid().not_null())
                    .col(ColumnDef::new(UsageEvents::EventType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(UsageEvents::Quantity)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UsageEvents::Metadata).json())
                    .col(ColumnDef::new(UsageEvents::Timestamp).timestamp().not_null())
                    .col(ColumnDef::new(UsageEvents::IdempotencyKey).string_len(255))
                    .col(ColumnDef::new(UsageEvents::InvoiceId).uuid())
                    .col(ColumnDef::new(UsageEvents::BilledAt).timestamp())
                    .col(ColumnDef::new(UsageEvents::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usage_events_tenant_id")
                            .from(UsageEvents::Table, UsageEvents::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        // Weak reference: deleting an invoice unlinks its
                        // events instead of deleting them.
                        ForeignKey::create()
                            .name("fk_usage_events_invoice_id")
                            .from(UsageEvents::Table, UsageEvents::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Linearizes duplicates: at most one event per (organization,
        // idempotency key). NULL keys never collide.
        manager
            .create_index(
                Index::create()
                    .name("idx_usage_events_org_idempotency_key")
                    .table(UsageEvents::Table)
                    .col(UsageEvents::OrganizationId)
                    .col(UsageEvents::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usage_events_tenant_timestamp")
                    .table(UsageEvents::Table)
                    .col(UsageEvents::TenantId)
                    .col(UsageEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usage_events_org_timestamp")
                    .table(UsageEvents::Table)
                    .col(UsageEvents::OrganizationId)
                    .col(UsageEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usage_events_invoice_id")
                    .table(UsageEvents::Table)
                    .col(UsageEvents::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsageSnapshots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsageSnapshots::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UsageSnapshots::TenantId).uuid().not_null())
                    .col(ColumnDef::new(UsageSnapshots::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(UsageSnapshots::SnapshotDate).date().not_null())
                    .col(ColumnDef::new(UsageSnapshots::EventType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(UsageSnapshots::TotalQuantity)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UsageSnapshots::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(UsageSnapshots::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usage_snapshots_tenant_id")
                            .from(UsageSnapshots::Table, UsageSnapshots::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One roll-up row per (tenant, day, event type); replays upsert.
        manager
            .create_index(
                Index::create()
                    .name("idx_usage_snapshots_tenant_date_type")
                    .table(UsageSnapshots::Table)
                    .col(UsageSnapshots::TenantId)
                    .col(UsageSnapshots::SnapshotDate)
                    .col(UsageSnapshots::EventType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuotaLimits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuotaLimits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(QuotaLimits::TenantId).uuid().not_null())
                    .col(ColumnDef::new(QuotaLimits::EventType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(QuotaLimits::LimitValue)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuotaLimits::SoftLimitValue).decimal_len(30, 6))
                    .col(ColumnDef::new(QuotaLimits::EnforcementMode).string_len(20).not_null())
                    .col(ColumnDef::new(QuotaLimits::OverageAllowed).decimal_len(30, 6))
                    .col(ColumnDef::new(QuotaLimits::GracePeriodEnd).timestamp())
                    .col(ColumnDef::new(QuotaLimits::ResetAt).timestamp().not_null())
                    .col(ColumnDef::new(QuotaLimits::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(QuotaLimits::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quota_limits_tenant_id")
                            .from(QuotaLimits::Table, QuotaLimits::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quota_limits_tenant_type")
                    .table(QuotaLimits::Table)
                    .col(QuotaLimits::TenantId)
                    .col(QuotaLimits::EventType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuotaLimits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsageSnapshots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsageEvents::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum UsageEvents {
    Table,
    Id,
    OrganizationId,
    TenantId,
    EventType,
    Quantity,
    Metadata,
    Timestamp,
    IdempotencyKey,
    InvoiceId,
    BilledAt,
    CreatedAt,
}

#[derive(Iden)]
enum UsageSnapshots {
    Table,
    Id,
    TenantId,
    OrganizationId,
    SnapshotDate,
    EventType,
    TotalQuantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum QuotaLimits {
    Table,
    Id,
    TenantId,
    EventType,
    LimitValue,
    SoftLimitValue,
    EnforcementMode,
    OverageAllowed,
    GracePeriodEnd,
    ResetAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
}

//! Billing tables migration: pricing_tiers, invoices, invoice_line_items

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PricingTiers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PricingTiers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PricingTiers::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(PricingTiers::EventType).string_len(100).not_null())
                    .col(ColumnDef::new(PricingTiers::TierLevel).integer().not_null())
                    .col(
                        ColumnDef::new(PricingTiers::MinQuantity)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PricingTiers::MaxQuantity).decimal_len(30, 6))
                    .col(
                        ColumnDef::new(PricingTiers::UnitPrice)
                            .decimal_len(20, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PricingTiers::EffectiveFrom).timestamp().not_null())
                    .col(ColumnDef::new(PricingTiers::EffectiveTo).timestamp())
                    .col(ColumnDef::new(PricingTiers::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pricing_tiers_organization_id")
                            .from(PricingTiers::Table, PricingTiers::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_tiers_org_type_level")
                    .table(PricingTiers::Table)
                    .col(PricingTiers::OrganizationId)
                    .col(PricingTiers::EventType)
                    .col(PricingTiers::TierLevel)
                    .col(PricingTiers::EffectiveFrom)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string_len(50).not_null())
                    .col(ColumnDef::new(Invoices::PeriodStart).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::PeriodEnd).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Invoices::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Tax).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Total).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::PaidAt).timestamp())
                    .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_organization_id")
                            .from(Invoices::Table, Invoices::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_tenant_id")
                            .from(Invoices::Table, Invoices::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Collisions on the generated number surface here; the builder
        // retries with the next sequence value.
        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_invoice_number")
                    .table(Invoices::Table)
                    .col(Invoices::InvoiceNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_tenant_period")
                    .table(Invoices::Table)
                    .col(Invoices::TenantId)
                    .col(Invoices::PeriodStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceLineItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(InvoiceLineItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(InvoiceLineItems::InvoiceId).uuid().not_null())
                    .col(ColumnDef::new(InvoiceLineItems::EventType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(InvoiceLineItems::Quantity)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceLineItems::UnitPrice)
                            .decimal_len(20, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceLineItems::TotalPrice).big_integer().not_null())
                    .col(ColumnDef::new(InvoiceLineItems::TierBreakdown).json().not_null())
                    .col(ColumnDef::new(InvoiceLineItems::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_line_items_invoice_id")
                            .from(InvoiceLineItems::Table, InvoiceLineItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_line_items_invoice_id")
                    .table(InvoiceLineItems::Table)
                    .col(InvoiceLineItems::InvoiceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceLineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PricingTiers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum PricingTiers {
    Table,
    Id,
    OrganizationId,
    EventType,
    TierLevel,
    MinQuantity,
    MaxQuantity,
    UnitPrice,
    EffectiveFrom,
    EffectiveTo,
    CreatedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    OrganizationId,
    TenantId,
    InvoiceNumber,
    PeriodStart,
    PeriodEnd,
    Status,
    Subtotal,
    Tax,
    Total,
    DueDate,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum InvoiceLineItems {
    Table,
    Id,
    InvoiceId,
    EventType,
    Quantity,
    UnitPrice,
    TotalPrice,
    TierBreakdown,
    CreatedAt,
}

#[derive(Iden)]
enum Organizations {
    Table,
    Id,
}

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
}

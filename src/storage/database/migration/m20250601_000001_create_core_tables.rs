//! Core tables migration: organizations, tenants, api_keys,
//! rate_limit_policies, subscriptions

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Organizations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(ColumnDef::new(Organizations::Slug).string_len(100).not_null())
                    .col(ColumnDef::new(Organizations::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Organizations::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_slug")
                    .table(Organizations::Table)
                    .col(Organizations::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenants::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tenants::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Tenants::ExternalId).string_len(100).not_null())
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Tenants::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tenants::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenants_organization_id")
                            .from(Tenants::Table, Tenants::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Part of the persisted-state contract: one tenant row per
        // (organization, external id), even under concurrent ingesters.
        manager
            .create_index(
                Index::create()
                    .name("idx_tenants_org_external_id")
                    .table(Tenants::Table)
                    .col(Tenants::OrganizationId)
                    .col(Tenants::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tenants_status")
                    .table(Tenants::Table)
                    .col(Tenants::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApiKeys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiKeys::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApiKeys::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(ApiKeys::Name).string().not_null())
                    .col(ColumnDef::new(ApiKeys::KeyHash).string_len(64).not_null())
                    .col(ColumnDef::new(ApiKeys::KeyPrefix).string_len(20).not_null())
                    .col(ColumnDef::new(ApiKeys::Permissions).json().not_null())
                    .col(ColumnDef::new(ApiKeys::ExpiresAt).timestamp())
                    .col(ColumnDef::new(ApiKeys::RevokedAt).timestamp())
                    .col(ColumnDef::new(ApiKeys::LastUsedAt).timestamp())
                    .col(ColumnDef::new(ApiKeys::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_keys_organization_id")
                            .from(ApiKeys::Table, ApiKeys::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_keys_key_hash")
                    .table(ApiKeys::Table)
                    .col(ApiKeys::KeyHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RateLimitPolicies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RateLimitPolicies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RateLimitPolicies::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(RateLimitPolicies::ApiKeyId).uuid())
                    .col(ColumnDef::new(RateLimitPolicies::RequestsPerSecond).big_integer())
                    .col(ColumnDef::new(RateLimitPolicies::RequestsPerMinute).big_integer())
                    .col(ColumnDef::new(RateLimitPolicies::RequestsPerHour).big_integer())
                    .col(ColumnDef::new(RateLimitPolicies::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(RateLimitPolicies::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rate_limit_policies_organization_id")
                            .from(RateLimitPolicies::Table, RateLimitPolicies::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rate_limit_policies_org_key")
                    .table(RateLimitPolicies::Table)
                    .col(RateLimitPolicies::OrganizationId)
                    .col(RateLimitPolicies::ApiKeyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subscriptions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Subscriptions::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Subscriptions::PspSubscriptionId).string().not_null())
                    .col(ColumnDef::new(Subscriptions::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Subscriptions::CurrentPeriodEnd).timestamp())
                    .col(ColumnDef::new(Subscriptions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Subscriptions::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_organization_id")
                            .from(Subscriptions::Table, Subscriptions::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_psp_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::PspSubscriptionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RateLimitPolicies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiKeys::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Organizations {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
    OrganizationId,
    ExternalId,
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ApiKeys {
    Table,
    Id,
    OrganizationId,
    Name,
    KeyHash,
    KeyPrefix,
    Permissions,
    ExpiresAt,
    RevokedAt,
    LastUsedAt,
    CreatedAt,
}

#[derive(Iden)]
enum RateLimitPolicies {
    Table,
    Id,
    OrganizationId,
    ApiKeyId,
    RequestsPerSecond,
    RequestsPerMinute,
    RequestsPerHour,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    OrganizationId,
    PspSubscriptionId,
    Status,
    CurrentPeriodEnd,
    CreatedAt,
    UpdatedAt,
}

use crate::storage::database::entities::invoice::{self, InvoiceStatus};
use crate::storage::database::entities::{invoice_line_item, usage_event};
use crate::storage::database::Database;
use crate::utils::error::{MeterError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// A fully priced invoice ready to commit in one transaction
#[derive(Debug, Clone)]
pub struct InvoiceCommit {
    pub organization_id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_number: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub due_date: DateTime<Utc>,
    pub line_items: Vec<LineItemCommit>,
}

/// One line item of an [`InvoiceCommit`]
#[derive(Debug, Clone)]
pub struct LineItemCommit {
    pub event_type: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: i64,
    pub tier_breakdown: serde_json::Value,
}

impl Database {
    /// Number of invoices ever created for an organization
    pub async fn count_invoices(&self, organization_id: Uuid) -> Result<u64> {
        Ok(invoice::Entity::find()
            .filter(invoice::Column::OrganizationId.eq(organization_id))
            .count(self.conn())
            .await?)
    }

    /// Commit an invoice atomically: insert the invoice and its line items,
    /// then back-link every not-yet-billed event in the period
    ///
    /// The `invoice_id IS NULL` filter on the back-link update is the
    /// serialization point: concurrent builds over overlapping ranges cannot
    /// bill the same event twice, the first commit wins.
    pub async fn commit_invoice(&self, commit: InvoiceCommit) -> Result<(invoice::Model, u64)> {
        let now = Utc::now();

        let result = self
            .conn()
            .transaction::<_, (invoice::Model, u64), sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let invoice_id = Uuid::new_v4();
                    let invoice_model = invoice::ActiveModel {
                        id: Set(invoice_id),
                        organization_id: Set(commit.organization_id),
                        tenant_id: Set(commit.tenant_id),
                        invoice_number: Set(commit.invoice_number.clone()),
                        period_start: Set(commit.period_start),
                        period_end: Set(commit.period_end),
                        status: Set(InvoiceStatus::Draft.as_str().to_string()),
                        subtotal: Set(commit.subtotal),
                        tax: Set(commit.tax),
                        total: Set(commit.total),
                        due_date: Set(commit.due_date),
                        paid_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    let inserted = invoice_model.insert(txn).await?;

                    if !commit.line_items.is_empty() {
                        let items: Vec<invoice_line_item::ActiveModel> = commit
                            .line_items
                            .into_iter()
                            .map(|item| invoice_line_item::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                invoice_id: Set(invoice_id),
                                event_type: Set(item.event_type),
                                quantity: Set(item.quantity),
                                unit_price: Set(item.unit_price),
                                total_price: Set(item.total_price),
                                tier_breakdown: Set(item.tier_breakdown),
                                created_at: Set(now),
                            })
                            .collect();
                        invoice_line_item::Entity::insert_many(items)
                            .exec_without_returning(txn)
                            .await?;
                    }

                    let backlinked = usage_event::Entity::update_many()
                        .col_expr(usage_event::Column::InvoiceId, Expr::value(invoice_id))
                        .col_expr(usage_event::Column::BilledAt, Expr::value(now))
                        .filter(usage_event::Column::TenantId.eq(commit.tenant_id))
                        .filter(usage_event::Column::Timestamp.gte(commit.period_start))
                        .filter(usage_event::Column::Timestamp.lt(commit.period_end))
                        .filter(usage_event::Column::InvoiceId.is_null())
                        .exec(txn)
                        .await?;

                    Ok((inserted, backlinked.rows_affected))
                })
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(sea_orm::TransactionError::Connection(e)) => Err(MeterError::Database(e)),
            Err(sea_orm::TransactionError::Transaction(e)) => Err(MeterError::Database(e)),
        }
    }

    /// Find an invoice by id
    pub async fn find_invoice(&self, id: Uuid) -> Result<Option<invoice::Model>> {
        Ok(invoice::Entity::find_by_id(id).one(self.conn()).await?)
    }

    /// Line items for an invoice
    pub async fn find_line_items(&self, invoice_id: Uuid) -> Result<Vec<invoice_line_item::Model>> {
        Ok(invoice_line_item::Entity::find()
            .filter(invoice_line_item::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_line_item::Column::EventType)
            .all(self.conn())
            .await?)
    }

    /// List an organization's invoices, newest first
    pub async fn list_invoices(&self, organization_id: Uuid) -> Result<Vec<invoice::Model>> {
        Ok(invoice::Entity::find()
            .filter(invoice::Column::OrganizationId.eq(organization_id))
            .order_by_desc(invoice::Column::CreatedAt)
            .all(self.conn())
            .await?)
    }

    /// Advance an invoice's status, enforcing the legal transitions
    pub async fn set_invoice_status(&self, id: Uuid, next: InvoiceStatus) -> Result<invoice::Model> {
        let current = self
            .find_invoice(id)
            .await?
            .ok_or_else(|| MeterError::not_found(format!("invoice {}", id)))?;

        if !current.invoice_status().can_transition_to(next) {
            return Err(MeterError::Conflict(format!(
                "invoice {} cannot move from {} to {}",
                id,
                current.status,
                next.as_str()
            )));
        }

        let model = invoice::ActiveModel {
            id: sea_orm::Unchanged(id),
            status: Set(next.as_str().to_string()),
            paid_at: if next == InvoiceStatus::Paid {
                Set(Some(Utc::now()))
            } else {
                sea_orm::NotSet
            },
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(invoice::Entity::update(model).exec(self.conn()).await?)
    }
}

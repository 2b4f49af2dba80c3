/// API key entity module
pub mod api_key;
/// Invoice entity module
pub mod invoice;
/// Invoice line item entity module
pub mod invoice_line_item;
/// Organization entity module
pub mod organization;
/// Pricing tier entity module
pub mod pricing_tier;
/// Quota limit entity module
pub mod quota_limit;
/// Rate limit policy entity module
pub mod rate_limit_policy;
/// Subscription entity module
pub mod subscription;
/// Tenant entity module
pub mod tenant;
/// Usage event entity module
pub mod usage_event;
/// Usage snapshot entity module
pub mod usage_snapshot;

pub use api_key::Entity as ApiKey;
pub use invoice::Entity as Invoice;
pub use invoice_line_item::Entity as InvoiceLineItem;
pub use organization::Entity as Organization;
pub use pricing_tier::Entity as PricingTier;
pub use quota_limit::Entity as QuotaLimit;
pub use rate_limit_policy::Entity as RateLimitPolicy;
pub use subscription::Entity as Subscription;
pub use tenant::Entity as Tenant;
pub use usage_event::Entity as UsageEvent;
pub use usage_snapshot::Entity as UsageSnapshot;

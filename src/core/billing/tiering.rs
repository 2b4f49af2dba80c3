//! Ordered tier walk: the step-function price curve

use crate::storage::database::entities::pricing_tier;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// One tier of a price curve: a half-open quantity band `[min, max)` with a
/// unit price
#[derive(Debug, Clone)]
pub struct TierSpec {
    pub tier_level: i32,
    pub min_quantity: Decimal,
    /// None = unbounded
    pub max_quantity: Option<Decimal>,
    /// Price per unit in currency units
    pub unit_price: Decimal,
}

impl From<&pricing_tier::Model> for TierSpec {
    fn from(model: &pricing_tier::Model) -> Self {
        Self {
            tier_level: model.tier_level,
            min_quantity: model.min_quantity,
            max_quantity: model.max_quantity,
            unit_price: model.unit_price,
        }
    }
}

/// One breakdown entry: the quantity consumed in a tier and what it cost
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierBreakdownEntry {
    pub tier_level: i32,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Cost of this slice, in cents
    pub subtotal: i64,
}

/// A fully priced event type
#[derive(Debug, Clone)]
pub struct PricedLine {
    /// Line total in cents
    pub total: i64,
    /// Per-tier breakdown
    pub breakdown: Vec<TierBreakdownEntry>,
}

/// Walk the ordered tiers and price a quantity
///
/// Each tier consumes `max(0, min(Q, max) − max(processed, min))` units.
/// When no tier matches at all (a curve misconfigured to start above zero),
/// the whole quantity is billed at the first tier's unit price.
pub fn price_quantity(quantity: Decimal, tiers: &[TierSpec]) -> PricedLine {
    let mut sorted: Vec<&TierSpec> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.tier_level);

    let mut total: i64 = 0;
    let mut breakdown = Vec::new();
    let mut processed = Decimal::ZERO;

    for tier in &sorted {
        if processed >= quantity {
            break;
        }

        let upper = tier.max_quantity.unwrap_or(quantity).min(quantity);
        let lower = processed.max(tier.min_quantity);
        let consumed = (upper - lower).max(Decimal::ZERO);

        if consumed > Decimal::ZERO {
            let subtotal = to_cents(consumed * tier.unit_price);
            total += subtotal;
            breakdown.push(TierBreakdownEntry {
                tier_level: tier.tier_level,
                quantity: consumed,
                unit_price: tier.unit_price,
                subtotal,
            });
            processed += consumed;
        }
    }

    if breakdown.is_empty() {
        if let Some(first) = sorted.first() {
            let subtotal = to_cents(quantity * first.unit_price);
            return PricedLine {
                total: subtotal,
                breakdown: vec![TierBreakdownEntry {
                    tier_level: first.tier_level,
                    quantity,
                    unit_price: first.unit_price,
                    subtotal,
                }],
            };
        }
    }

    PricedLine { total, breakdown }
}

/// Currency units to cents, rounding half away from zero
pub(super) fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Display-only average unit price `total / quantity`
pub(super) fn average_unit_price(total_cents: i64, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        return Decimal::ZERO;
    }
    (Decimal::from(total_cents) / Decimal::from(100) / quantity).round_dp(6)
}

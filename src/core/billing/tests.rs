//! Billing engine tests

use super::invoice_builder::{format_invoice_number, tax_on, uncovered_runs};
use super::tiering::{average_unit_price, price_quantity, to_cents, TierSpec};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::HashSet;

fn tier(level: i32, min: rust_decimal::Decimal, max: Option<rust_decimal::Decimal>, price: rust_decimal::Decimal) -> TierSpec {
    TierSpec {
        tier_level: level,
        min_quantity: min,
        max_quantity: max,
        unit_price: price,
    }
}

#[test]
fn test_two_tier_curve_prices_1500_units() {
    // [0, 1000) at $0.10, [1000, ∞) at $0.05 bills 1500 as
    // 1000·0.10 + 500·0.05 = $125.00.
    let tiers = vec![
        tier(1, dec!(0), Some(dec!(1000)), dec!(0.10)),
        tier(2, dec!(1000), None, dec!(0.05)),
    ];

    let priced = price_quantity(dec!(1500), &tiers);
    assert_eq!(priced.total, 12_500);
    assert_eq!(priced.breakdown.len(), 2);
    assert_eq!(priced.breakdown[0].quantity, dec!(1000));
    assert_eq!(priced.breakdown[0].subtotal, 10_000);
    assert_eq!(priced.breakdown[1].quantity, dec!(500));
    assert_eq!(priced.breakdown[1].subtotal, 2_500);
}

#[test]
fn test_quantity_inside_first_tier() {
    let tiers = vec![
        tier(1, dec!(0), Some(dec!(1000)), dec!(0.10)),
        tier(2, dec!(1000), None, dec!(0.05)),
    ];

    let priced = price_quantity(dec!(400), &tiers);
    assert_eq!(priced.total, 4_000);
    assert_eq!(priced.breakdown.len(), 1);
    assert_eq!(priced.breakdown[0].quantity, dec!(400));
}

#[test]
fn test_quantity_at_tier_boundary() {
    // Exactly 1000 units stays entirely in [0, 1000).
    let tiers = vec![
        tier(1, dec!(0), Some(dec!(1000)), dec!(0.10)),
        tier(2, dec!(1000), None, dec!(0.05)),
    ];

    let priced = price_quantity(dec!(1000), &tiers);
    assert_eq!(priced.total, 10_000);
    assert_eq!(priced.breakdown.len(), 1);
}

#[test]
fn test_three_tier_walk() {
    let tiers = vec![
        tier(1, dec!(0), Some(dec!(100)), dec!(1)),
        tier(2, dec!(100), Some(dec!(200)), dec!(0.5)),
        tier(3, dec!(200), None, dec!(0.25)),
    ];

    let priced = price_quantity(dec!(250), &tiers);
    // 100·1 + 100·0.5 + 50·0.25 = 162.50
    assert_eq!(priced.total, 16_250);
    assert_eq!(priced.breakdown.len(), 3);
}

#[test]
fn test_misconfigured_curve_falls_back_to_first_tier_price() {
    // Every tier starts above zero; nothing matches a small quantity.
    let tiers = vec![tier(1, dec!(500), None, dec!(0.10))];

    let priced = price_quantity(dec!(100), &tiers);
    assert_eq!(priced.total, 1_000);
    assert_eq!(priced.breakdown.len(), 1);
    assert_eq!(priced.breakdown[0].quantity, dec!(100));
}

#[test]
fn test_no_tiers_prices_nothing() {
    let priced = price_quantity(dec!(100), &[]);
    assert_eq!(priced.total, 0);
    assert!(priced.breakdown.is_empty());
}

#[test]
fn test_fractional_quantities_price_at_scale() {
    let tiers = vec![tier(1, dec!(0), None, dec!(0.10))];
    let priced = price_quantity(dec!(1.5), &tiers);
    assert_eq!(priced.total, 15);
}

#[test]
fn test_to_cents_rounds_half_away_from_zero() {
    assert_eq!(to_cents(dec!(1.005)), 101);
    assert_eq!(to_cents(dec!(1.004)), 100);
    assert_eq!(to_cents(dec!(125.00)), 12_500);
}

#[test]
fn test_average_unit_price_is_display_only_ratio() {
    // 12500 cents over 1500 units ≈ 0.083333
    let avg = average_unit_price(12_500, dec!(1500));
    assert_eq!(avg, dec!(0.083333));
}

#[test]
fn test_average_unit_price_zero_quantity() {
    assert_eq!(average_unit_price(0, dec!(0)), dec!(0));
}

#[test]
fn test_tax_is_ten_percent_of_subtotal() {
    assert_eq!(tax_on(12_500, 0.10), 1_250);
    assert_eq!(tax_on(0, 0.10), 0);
}

#[test]
fn test_invoice_number_format() {
    assert_eq!(format_invoice_number("acme", 7), "INV-ACME-000007");
    assert_eq!(format_invoice_number("acme", 1_234_567), "INV-ACME-1234567");
}

#[test]
fn test_uncovered_runs_full_coverage() {
    let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let last = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
    let covered: HashSet<NaiveDate> = (0..5)
        .map(|i| first + chrono::Duration::days(i))
        .collect();

    assert!(uncovered_runs(first, last, &covered).is_empty());
}

#[test]
fn test_uncovered_runs_no_coverage() {
    let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let last = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
    let runs = uncovered_runs(first, last, &HashSet::new());
    assert_eq!(runs, vec![(first, last)]);
}

#[test]
fn test_uncovered_runs_gap_in_the_middle() {
    let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let last = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
    let mut covered = HashSet::new();
    covered.insert(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    covered.insert(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    covered.insert(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());

    let runs = uncovered_runs(first, last, &covered);
    assert_eq!(
        runs,
        vec![(
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()
        )]
    );
}

#[test]
fn test_scenario_tiered_invoice_totals() {
    // Full scenario: Q=1500 on the two-tier curve, 10% tax.
    let tiers = vec![
        tier(1, dec!(0), Some(dec!(1000)), dec!(0.10)),
        tier(2, dec!(1000), None, dec!(0.05)),
    ];
    let priced = price_quantity(dec!(1500), &tiers);

    let subtotal = priced.total;
    let tax = tax_on(subtotal, 0.10);
    let total = subtotal + tax;

    assert_eq!(subtotal, 12_500);
    assert_eq!(tax, 1_250);
    assert_eq!(total, 13_750);
    assert_eq!(average_unit_price(subtotal, dec!(1500)), dec!(0.083333));
}

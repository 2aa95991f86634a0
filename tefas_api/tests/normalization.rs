//! Fixture-driven normalization tests: realistic grid bodies, both
//! current and legacy column vintages.

use chrono::NaiveDate;
use serde_json::Value;
use tefas_api::types::ReturnHorizon;
use tefas_api::{normalize_allocations, normalize_history, normalize_snapshots};

fn load_rows(name: &str) -> Vec<Value> {
    let body = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
    let envelope: Value = serde_json::from_str(&body).unwrap();
    envelope["data"].as_array().unwrap().clone()
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

#[test]
fn returns_fixture_normalizes_all_rows() {
    let snapshots = normalize_snapshots(&load_rows("returns.json"), as_of());
    assert_eq!(snapshots.len(), 3);

    let mac = &snapshots[0];
    assert_eq!(mac.code, "MAC");
    assert_eq!(
        mac.category.as_deref(),
        Some("Hisse Senedi Şemsiye Fonu")
    );
    // 1_250_000_000 / 500_000_000, not the 9.99 in the FIYAT column.
    assert_eq!(mac.unit_price, Some(2.5));
    assert_eq!(mac.returns.len(), 6);
    assert_eq!(mac.returns.get(&ReturnHorizon::FiveYears), Some(&812.44));
    assert!(!mac.returns.contains_key(&ReturnHorizon::OneDay));

    // Turkish-formatted strings from the older grid vintage.
    let aft = &snapshots[1];
    assert_eq!(aft.portfolio_value, Some(8_400_000_000.0));
    assert_eq!(aft.unit_price, Some(4.2));
    assert_eq!(aft.returns.get(&ReturnHorizon::OneMonth), Some(&-1.05));
}

#[test]
fn sizes_fixture_drops_undecipherable_rows_only() {
    let snapshots = normalize_snapshots(&load_rows("sizes.json"), as_of());
    // BOS has neither AUM nor units and is dropped; the batch survives.
    assert_eq!(snapshots.len(), 3);
    let codes: Vec<_> = snapshots.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["MAC", "GMR", "ZRO"]);

    // Legacy column names.
    assert_eq!(snapshots[1].portfolio_value, Some(95_000_000.5));
    assert!((snapshots[1].unit_price.unwrap() - 1.90000001).abs() < 1e-9);

    // Zero units: price absent, not infinite.
    assert_eq!(snapshots[2].unit_price, None);
}

#[test]
fn history_fixture_yields_ascending_series() {
    let points = normalize_history(&load_rows("history.json"));
    assert_eq!(points.len(), 4);
    assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(
        points[0].date,
        NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()
    );
    // Oldest two rows carry no size columns; the price column is used.
    assert_eq!(points[0].unit_price, 2.4795);
    assert_eq!(points[1].unit_price, 2.488);
    // Newest rows recompute from value/units.
    assert_eq!(points[3].unit_price, 1250500000.0 / 500000000.0);
}

#[test]
fn allocation_fixture_keeps_nonzero_columns_in_order() {
    let allocations = normalize_allocations(&load_rows("allocation.json"));
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].fund_code, "MAC");
    let labels: Vec<_> = allocations[0]
        .allocations
        .iter()
        .map(|w| w.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Stock",
            "Exchange-Traded Fund",
            "Repo",
            "Term Deposit",
            "Other"
        ]
    );
    let total: f64 = allocations[0].allocations.iter().map(|w| w.percent).sum();
    assert!(total < 100.0);
}

//! Table-driven normalization of raw portal rows.
//!
//! Different endpoints (and different vintages of the same endpoint)
//! use different column names for the same value, serve numbers either
//! as JSON numbers or Turkish-formatted strings, and encode dates as
//! epoch milliseconds, `/Date(ms)/` wrappers, or `DD.MM.YYYY`. Each
//! canonical field therefore maps to an ordered probe list of source
//! names; the first present one wins. The probe lists are curated
//! configuration, refreshed when the portal drifts.
//!
//! A row that cannot yield a usable record is dropped and counted,
//! never allowed to fail the whole batch.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::types::{AssetWeight, FundHistoryPoint, FundSectorAllocation, FundSnapshot, ReturnHorizon};

const CODE_FIELDS: &[&str] = &["FONKODU", "FONKOD"];
const TITLE_FIELDS: &[&str] = &["FONUNVAN", "FONADI"];
const CATEGORY_FIELDS: &[&str] = &["FONTURACIKLAMA", "FONTUR", "FONUNVANTIP"];
const PORTFOLIO_VALUE_FIELDS: &[&str] = &["PORTFOYBUYUKLUK", "PORTBUYUKLUK", "PORTFOYDEGERI"];
const UNITS_FIELDS: &[&str] = &["TEDPAYSAYISI", "PAYADET", "TEDPAYSAYI"];
const DATE_FIELDS: &[&str] = &["TARIH", "BILGITARIHI"];
/// Only consulted by history normalization, and only when the price
/// cannot be recomputed; snapshot prices never come from these.
const PRICE_FIELDS: &[&str] = &["FIYAT", "BIRIMPAYDEGER"];

const RETURN_FIELDS: &[(ReturnHorizon, &[&str])] = &[
    (ReturnHorizon::OneDay, &["GETIRI1G", "GUNLUKGETIRI"]),
    (ReturnHorizon::OneMonth, &["GETIRI1A"]),
    (ReturnHorizon::ThreeMonths, &["GETIRI3A"]),
    (ReturnHorizon::SixMonths, &["GETIRI6A"]),
    (ReturnHorizon::OneYear, &["GETIRI1Y", "GETIRIYIL"]),
    (ReturnHorizon::ThreeYears, &["GETIRI3Y"]),
    (ReturnHorizon::FiveYears, &["GETIRI5Y"]),
];

/// Allocation-grid columns, in the portal's column order, mapped to
/// display labels. Columns absent or zero in a row are skipped.
const ASSET_COLUMNS: &[(&str, &str)] = &[
    ("HS", "Stock"),
    ("DT", "Government Bond"),
    ("OST", "Corporate Bond"),
    ("BYF", "Exchange-Traded Fund"),
    ("KMG", "Precious Metals"),
    ("R", "Repo"),
    ("TRP", "Reverse Repo"),
    ("VM", "Term Deposit"),
    ("KH", "Participation Account"),
    ("YMK", "Foreign Securities"),
    ("FKB", "Fund Participation"),
    ("D", "Other"),
];

/// Normalizes comparison-grid rows into snapshots for `as_of`.
///
/// A row missing its fund code, or missing both portfolio value and
/// units outstanding (no price can ever be derived from it), is
/// dropped; the drop count is logged once per batch.
pub fn normalize_snapshots(raw: &[Value], as_of: NaiveDate) -> Vec<FundSnapshot> {
    let mut out = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for row in raw {
        match snapshot_from_row(row, as_of) {
            Some(snapshot) => out.push(snapshot),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = out.len(), "dropped malformed snapshot rows");
    }
    out
}

fn snapshot_from_row(row: &Value, as_of: NaiveDate) -> Option<FundSnapshot> {
    let fields = row.as_object()?;
    let code = probe_string(fields, CODE_FIELDS)?;
    let portfolio_value = probe_number(fields, PORTFOLIO_VALUE_FIELDS);
    let units_outstanding = probe_number(fields, UNITS_FIELDS);
    if portfolio_value.is_none() && units_outstanding.is_none() {
        return None;
    }

    let mut returns = BTreeMap::new();
    for (horizon, names) in RETURN_FIELDS {
        if let Some(pct) = probe_number(fields, names) {
            returns.insert(*horizon, pct);
        }
    }

    Some(FundSnapshot {
        code,
        title: probe_string(fields, TITLE_FIELDS),
        category: probe_string(fields, CATEGORY_FIELDS),
        portfolio_value,
        units_outstanding,
        unit_price: derive_unit_price(portfolio_value, units_outstanding),
        returns,
        as_of,
    })
}

/// Normalizes history rows into an ascending unit-price series.
///
/// The unit price is recomputed from value/units when both are
/// present; the grid's own price column is only a fallback, because
/// the column has been observed stale relative to the size columns.
pub fn normalize_history(raw: &[Value]) -> Vec<FundHistoryPoint> {
    let mut out = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for row in raw {
        match history_point_from_row(row) {
            Some(point) => out.push(point),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = out.len(), "dropped malformed history rows");
    }
    out.sort_by_key(|p| p.date);
    out
}

fn history_point_from_row(row: &Value) -> Option<FundHistoryPoint> {
    let fields = row.as_object()?;
    let date = probe_date(fields, DATE_FIELDS)?;
    let recomputed = derive_unit_price(
        probe_number(fields, PORTFOLIO_VALUE_FIELDS),
        probe_number(fields, UNITS_FIELDS),
    );
    let unit_price = recomputed.or_else(|| probe_number(fields, PRICE_FIELDS))?;
    Some(FundHistoryPoint { date, unit_price })
}

/// Normalizes allocation rows, keeping the portal's column order and
/// skipping absent or zero columns. Percentages are reported as-is;
/// they need not sum to 100.
pub fn normalize_allocations(raw: &[Value]) -> Vec<FundSectorAllocation> {
    let mut out = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for row in raw {
        match allocation_from_row(row) {
            Some(allocation) => out.push(allocation),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = out.len(), "dropped malformed allocation rows");
    }
    out
}

fn allocation_from_row(row: &Value) -> Option<FundSectorAllocation> {
    let fields = row.as_object()?;
    let fund_code = probe_string(fields, CODE_FIELDS)?;
    let allocations = ASSET_COLUMNS
        .iter()
        .filter_map(|&(column, label)| {
            let percent = probe_number(fields, &[column])?;
            (percent != 0.0).then(|| AssetWeight {
                label: label.to_string(),
                percent,
            })
        })
        .collect();
    Some(FundSectorAllocation {
        fund_code,
        allocations,
    })
}

/// `portfolio_value / units_outstanding`, or absent when units are
/// zero or missing. Never zero, never infinite.
fn derive_unit_price(portfolio_value: Option<f64>, units_outstanding: Option<f64>) -> Option<f64> {
    match (portfolio_value, units_outstanding) {
        (Some(value), Some(units)) if units > 0.0 => Some(value / units),
        _ => None,
    }
}

fn probe<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| fields.get(*name))
        .filter(|v| !v.is_null())
}

fn probe_string(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    let value = probe(fields, names)?;
    let s = value.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn probe_number(fields: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    match probe(fields, names)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn probe_date(fields: &Map<String, Value>, names: &[&str]) -> Option<NaiveDate> {
    match probe(fields, names)? {
        Value::Number(n) => date_from_millis(n.as_i64()?),
        Value::String(s) => parse_date_value(s),
        _ => None,
    }
}

/// Parses a grid number. Accepts plain decimals plus the Turkish
/// locale form with dot thousands separators and a comma decimal mark
/// ("1.234.567,89").
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    if s.contains(',') {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        return normalized.parse().ok();
    }
    // Without a comma, dots can still be grouping separators
    // ("1.000.000") rather than a decimal point ("1234.5"). They are
    // separators only when every dot is followed by exactly three
    // digits.
    if is_dot_grouped(s) {
        let stripped: String = s.chars().filter(|c| *c != '.').collect();
        return stripped.parse().ok();
    }
    s.parse().ok()
}

fn is_dot_grouped(s: &str) -> bool {
    let mut parts = s.split('.');
    let Some(first) = parts.next() else {
        return false;
    };
    let lead = first.strip_prefix('-').unwrap_or(first);
    let mut rest = parts.peekable();
    rest.peek().is_some()
        && (1..=3).contains(&lead.len())
        && lead.chars().all(|c| c.is_ascii_digit())
        && rest.all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()))
}

fn parse_date_value(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // ASP.NET wire format: /Date(1717372800000)/
    if let Some(inner) = s.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        return date_from_millis(inner.parse().ok()?);
    }
    if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        return date_from_millis(s.parse().ok()?);
    }
    NaiveDate::parse_from_str(s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    Some(DateTime::from_timestamp_millis(millis)?.date_naive())
}

use anyhow::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tefas_lib::types::{FundHistoryPoint, FundSectorAllocation, FundSnapshot, ReturnHorizon};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct FundRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    #[serde(rename = "Category")]
    category: String,
    #[tabled(rename = "AUM")]
    #[serde(rename = "AUM")]
    portfolio_value: String,
    #[tabled(rename = "Unit Price")]
    #[serde(rename = "Unit Price")]
    unit_price: String,
    #[tabled(rename = "1m")]
    #[serde(rename = "1m")]
    one_month: String,
    #[tabled(rename = "1y")]
    #[serde(rename = "1y")]
    one_year: String,
}

#[derive(Tabled, Serialize)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Unit Price")]
    #[serde(rename = "Unit Price")]
    unit_price: String,
}

#[derive(Tabled, Serialize)]
struct AllocationRow {
    #[tabled(rename = "Asset Class")]
    #[serde(rename = "Asset Class")]
    label: String,
    #[tabled(rename = "% of Portfolio")]
    #[serde(rename = "% of Portfolio")]
    percent: String,
}

// -- Row builders --

fn build_fund_rows(funds: &[FundSnapshot]) -> Vec<FundRow> {
    funds
        .iter()
        .map(|f| FundRow {
            code: f.code.clone(),
            title: f.title.clone().unwrap_or_default(),
            category: f.category.clone().unwrap_or_default(),
            portfolio_value: f.portfolio_value.map(format_currency).unwrap_or_default(),
            unit_price: f
                .unit_price
                .map(|p| format!("{p:.4}"))
                .unwrap_or_default(),
            one_month: format_return(f.returns.get(&ReturnHorizon::OneMonth).copied()),
            one_year: format_return(f.returns.get(&ReturnHorizon::OneYear).copied()),
        })
        .collect()
}

fn build_history_rows(points: &[FundHistoryPoint]) -> Vec<HistoryRow> {
    points
        .iter()
        .map(|p| HistoryRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            unit_price: format!("{:.4}", p.unit_price),
        })
        .collect()
}

fn build_allocation_rows(allocation: &FundSectorAllocation) -> Vec<AllocationRow> {
    allocation
        .allocations
        .iter()
        .map(|w| AllocationRow {
            label: w.label.clone(),
            percent: format!("{:.2}", w.percent),
        })
        .collect()
}

// -- Formatting --

/// AUM in TRY, scaled to thousands/millions/billions. Rounded half
/// away from zero; `{:.1}` alone rounds half to even and would render
/// 1.25B as 1.2B.
fn format_currency(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("₺{:.1}B", round_tenth(value / 1e9))
    } else if abs >= 1e6 {
        format!("₺{:.1}M", round_tenth(value / 1e6))
    } else if abs >= 1e3 {
        format!("₺{:.1}K", round_tenth(value / 1e3))
    } else {
        format!("₺{:.0}", value.round())
    }
}

fn round_tenth(scaled: f64) -> f64 {
    (scaled * 10.0).round() / 10.0
}

/// Signed percentage, or a dash for an absent horizon. An absent
/// return must never render as 0%.
fn format_return(pct: Option<f64>) -> String {
    match pct {
        Some(pct) => format!("{pct:+.2}%"),
        None => "—".to_string(),
    }
}

// -- Printers --

pub fn print_funds_table(funds: &[FundSnapshot]) {
    println!("{}", Table::new(build_fund_rows(funds)).with(Style::psql()));
}

pub fn print_history_table(points: &[FundHistoryPoint]) {
    println!(
        "{}",
        Table::new(build_history_rows(points)).with(Style::psql())
    );
}

pub fn print_allocation_table(allocation: &FundSectorAllocation) {
    println!(
        "{}",
        Table::new(build_allocation_rows(allocation)).with(Style::psql())
    );
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod output_tests;

//! Canonical fund records produced by normalization.
//!
//! These are the only shapes downstream consumers see; the raw grid
//! rows with their drifting Turkish column names never leave the
//! normalizer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Return horizons published by the comparison grids, ordered shortest
/// to longest so a `BTreeMap` keyed on this iterates in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnHorizon {
    OneDay,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
}

impl fmt::Display for ReturnHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReturnHorizon::OneDay => "1d",
            ReturnHorizon::OneMonth => "1m",
            ReturnHorizon::ThreeMonths => "3m",
            ReturnHorizon::SixMonths => "6m",
            ReturnHorizon::OneYear => "1y",
            ReturnHorizon::ThreeYears => "3y",
            ReturnHorizon::FiveYears => "5y",
        };
        write!(f, "{label}")
    }
}

impl FromStr for ReturnHorizon {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(ReturnHorizon::OneDay),
            "1m" => Ok(ReturnHorizon::OneMonth),
            "3m" => Ok(ReturnHorizon::ThreeMonths),
            "6m" => Ok(ReturnHorizon::SixMonths),
            "1y" => Ok(ReturnHorizon::OneYear),
            "3y" => Ok(ReturnHorizon::ThreeYears),
            "5y" => Ok(ReturnHorizon::FiveYears),
            _ => Err(()),
        }
    }
}

/// One fund as of a single trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSnapshot {
    /// Short fund identifier, unique per fund (e.g. `AAK`).
    pub code: String,
    pub title: Option<String>,
    /// Umbrella-fund regulatory category, as published by the portal.
    pub category: Option<String>,
    /// Total AUM in local currency.
    pub portfolio_value: Option<f64>,
    pub units_outstanding: Option<f64>,
    /// Always `portfolio_value / units_outstanding`, recomputed at
    /// normalization time. Absent when units are zero or missing.
    pub unit_price: Option<f64>,
    /// Signed percentage per horizon. A horizon the source omitted is
    /// absent here, never zero.
    #[serde(default)]
    pub returns: BTreeMap<ReturnHorizon, f64>,
    pub as_of: NaiveDate,
}

/// One point of a fund's unit-price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundHistoryPoint {
    pub date: NaiveDate,
    pub unit_price: f64,
}

/// One asset-class slice of a fund's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetWeight {
    pub label: String,
    pub percent: f64,
}

/// A fund's portfolio breakdown by asset class, in upstream column
/// order. Percentages need not sum to 100; residual cash is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSectorAllocation {
    pub fund_code: String,
    pub allocations: Vec<AssetWeight>,
}

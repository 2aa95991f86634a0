//! Trading-calendar date resolution.
//!
//! Pure logic, no I/O. The portal publishes nothing for weekends and
//! has no data beyond a fixed ceiling year, so requested dates are
//! rolled back to the preceding Friday and clamped to the ceiling.
//! Market holidays are not modeled: a holiday query comes back from
//! the portal as an empty data array and callers treat that as a data
//! gap, not an error.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::Error;

/// Last year the portal is known to carry data for. Refreshed when the
/// upstream horizon moves.
const DEFAULT_CEILING_YEAR: i32 = 2025;

/// Resolves the trading date a query should be issued for.
#[derive(Debug, Clone, Copy)]
pub struct TradingCalendar {
    ceiling_year: i32,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING_YEAR)
    }
}

impl TradingCalendar {
    /// Creates a calendar with an explicit data-horizon ceiling year.
    pub fn new(ceiling_year: i32) -> Self {
        Self { ceiling_year }
    }

    /// Returns the most recent date the portal can have data for,
    /// given `requested`: weekends roll back to the preceding Friday
    /// and anything past the ceiling year clamps to its December 31.
    pub fn resolve_as_of(&self, requested: NaiveDate) -> NaiveDate {
        let clamped = if requested.year() > self.ceiling_year {
            // NaiveDate::from_ymd_opt is always Some for Dec 31.
            NaiveDate::from_ymd_opt(self.ceiling_year, 12, 31).unwrap_or(requested)
        } else {
            requested
        };
        match clamped.weekday() {
            Weekday::Sat => clamped - Duration::days(1),
            Weekday::Sun => clamped - Duration::days(2),
            _ => clamped,
        }
    }

    /// Resolves today's as-of date.
    pub fn resolve_today(&self) -> NaiveDate {
        self.resolve_as_of(Utc::now().date_naive())
    }

    /// Clamps both ends of a history range and rejects inverted input.
    pub fn resolve_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate), Error> {
        if from > to {
            return Err(Error::InvalidDate(format!(
                "range start {from} is after range end {to}"
            )));
        }
        let end = self.resolve_as_of(to);
        let start = from.min(end);
        Ok((start, end))
    }
}

/// Parses `DD.MM.YYYY` (the portal's form format) or ISO `YYYY-MM-DD`.
pub fn parse_date(input: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(input, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .map_err(|_| Error::InvalidDate(format!("not a calendar date: {input:?}")))
}

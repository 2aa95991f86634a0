//! The facade the rest of the application consumes.
//!
//! Dashboard, portfolio valuation, and analysis pages depend on these
//! four methods and the canonical record types — nothing else. Each
//! method is one acquisition call plus one normalization pass; the
//! comparison grids return the whole fund universe, so single-fund
//! lookups filter client-side by code.

use std::time::Duration;

use chrono::NaiveDate;

use tefas_api::types::{FundHistoryPoint, FundSectorAllocation, FundSnapshot};
use tefas_api::{
    normalize_allocations, normalize_history, normalize_snapshots, FundDataClient, QueryKind,
    QueryParams,
};

use crate::cache::MemoryCache;
use crate::TefasError;

/// Read-only fund data service over the TEFAS portal.
pub struct FundDataService {
    client: FundDataClient,
    cache: Option<MemoryCache>,
}

impl FundDataService {
    /// Service against the production portal, no memoization.
    pub fn new() -> Result<Self, TefasError> {
        Ok(Self {
            client: FundDataClient::new()?,
            cache: None,
        })
    }

    /// Service against a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, TefasError> {
        Ok(Self {
            client: FundDataClient::with_base_url(base_url)?,
            cache: None,
        })
    }

    /// Enables short-TTL memoization of the whole-universe queries.
    /// Per-fund history and allocation results are never cached.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(MemoryCache::new(ttl));
        self
    }

    /// Current snapshot for one fund, filtered out of the returns
    /// grid. `TefasError::NotFound` when the code matches nothing.
    pub async fn get_snapshot(&self, code: &str) -> Result<FundSnapshot, TefasError> {
        let code = validate_code(code)?;
        let universe = self.universe(QueryKind::CurrentReturns).await?;
        universe
            .into_iter()
            .find(|s| s.code == code)
            .ok_or_else(|| {
                tracing::debug!(%code, "fund code not present in returns grid");
                TefasError::NotFound { code }
            })
    }

    /// Every fund the portal knows, from the sizes grid.
    pub async fn list_all_funds(&self) -> Result<Vec<FundSnapshot>, TefasError> {
        self.universe(QueryKind::CurrentSizes).await
    }

    /// Ascending unit-price series for one fund over `[from, to]`.
    /// An empty series is a market-holiday data gap, returned as-is.
    pub async fn get_history(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FundHistoryPoint>, TefasError> {
        let code = validate_code(code)?;
        let rows = self
            .client
            .execute(
                QueryKind::History,
                &QueryParams {
                    fund_code: Some(code),
                    range: Some((from, to)),
                    ..Default::default()
                },
            )
            .await?;
        Ok(normalize_history(&rows))
    }

    /// Portfolio asset-class breakdown for one fund.
    pub async fn get_allocation(&self, code: &str) -> Result<FundSectorAllocation, TefasError> {
        let code = validate_code(code)?;
        let rows = self
            .client
            .execute(
                QueryKind::PieAllocation,
                &QueryParams {
                    fund_code: Some(code.clone()),
                    ..Default::default()
                },
            )
            .await?;
        // The endpoint takes fonkod, but filter anyway; the portal has
        // been seen answering per-fund queries with unrelated rows.
        normalize_allocations(&rows)
            .into_iter()
            .find(|a| a.fund_code == code)
            .ok_or_else(|| {
                tracing::debug!(%code, "no allocation rows for fund code");
                TefasError::NotFound { code }
            })
    }

    async fn universe(&self, kind: QueryKind) -> Result<Vec<FundSnapshot>, TefasError> {
        let as_of = self.client.calendar().resolve_today();
        let cache_key = format!("{kind}:{as_of}");

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_records::<Vec<FundSnapshot>>(&cache_key)? {
                tracing::debug!(%kind, "serving universe from cache");
                return Ok(cached);
            }
        }

        let rows = self.client.execute(kind, &QueryParams::default()).await?;
        let snapshots = normalize_snapshots(&rows, as_of);

        if let Some(cache) = &self.cache {
            cache.set_records(&cache_key, &snapshots)?;
        }
        Ok(snapshots)
    }
}

/// Fund codes are short uppercase identifiers; trim and uppercase the
/// input, reject empty.
fn validate_code(code: &str) -> Result<String, TefasError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(TefasError::InvalidInput(
            "fund code must not be empty".to_string(),
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TefasError::InvalidInput(format!(
            "fund code must be alphanumeric, got {code:?}"
        )));
    }
    Ok(code)
}

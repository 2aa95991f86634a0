//! Error types for the TEFAS client.

use crate::endpoints::QueryKind;

/// One failed endpoint candidate, kept for diagnostics when every
/// candidate for a query kind has been exhausted.
#[derive(Debug, Clone)]
pub struct EndpointAttempt {
    /// Endpoint name, e.g. `BindComparisonFundReturns`.
    pub endpoint: &'static str,
    /// Why the candidate was rejected (status code, parse failure, timeout).
    pub reason: String,
}

/// Errors that can occur while acquiring or normalizing fund data.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller supplied a date that is not a valid calendar date,
    /// or an inverted date range. Not retried.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The session bootstrap GET failed at the transport level or the
    /// portal returned no cookies. Retried with capped backoff by the
    /// data client, never looped indefinitely.
    #[error("failed to acquire session: {0}")]
    SessionAcquisition(String),

    /// The TLS handshake failed even with the legacy compatibility
    /// profile applied. Indicates an upstream outage, not a stale
    /// session; surfaced immediately.
    #[error("transport negotiation with upstream failed: {0}")]
    TransportNegotiation(String),

    /// Every endpoint candidate for the query kind failed after the
    /// one allowed session-refresh retry each.
    #[error("no usable endpoint for {kind} ({} candidate(s) tried)", .attempts.len())]
    NoUsableEndpoint {
        kind: QueryKind,
        attempts: Vec<EndpointAttempt>,
    },
}

impl Error {
    /// Renders the per-candidate failure reasons, one per line, for
    /// operator logs. Empty for other variants.
    pub fn attempt_report(&self) -> String {
        match self {
            Error::NoUsableEndpoint { attempts, .. } => attempts
                .iter()
                .map(|a| format!("{}: {}", a.endpoint, a.reason))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

//! HTTP client orchestrating session, transport, and endpoint fallback.

use std::time::Duration;

use chrono::NaiveDate;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    calendar::TradingCalendar,
    endpoints::{candidates, EndpointSpec, PayloadContext, QueryKind, COMPARISON_PAGE},
    session::{Session, SessionManager},
    transport::TransportProfile,
    EndpointAttempt, Error,
};

const PRODUCTION_BASE_URL: &str = "https://www.tefas.gov.tr";

/// Session bootstrap retries: capped exponential backoff, 3 attempts.
const BOOTSTRAP_ATTEMPTS: u32 = 3;
const BOOTSTRAP_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Parameters of one logical query.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Required by the per-fund endpoints (`History`, `PieAllocation`);
    /// the comparison grids return the whole universe and callers
    /// filter client-side instead.
    pub fund_code: Option<String>,
    /// Requested snapshot date. Defaults to today; weekends and
    /// past-horizon dates are resolved by the trading calendar either
    /// way.
    pub as_of: Option<NaiveDate>,
    /// History date range. Defaults to the resolved as-of date on both
    /// ends.
    pub range: Option<(NaiveDate, NaiveDate)>,
}

/// Executes logical queries against the portal: resolves the trading
/// date, holds a session, walks the endpoint fallback list, and hands
/// back the raw `data` rows for normalization.
pub struct FundDataClient {
    base_url: String,
    http: reqwest::Client,
    session: SessionManager,
    calendar: TradingCalendar,
}

impl FundDataClient {
    /// Client against the production portal with default transport and
    /// calendar settings.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(PRODUCTION_BASE_URL)
    }

    /// Client against a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_parts(
            base_url,
            TransportProfile::default(),
            TradingCalendar::default(),
        )
    }

    /// Fully parameterized constructor.
    pub fn with_parts(
        base_url: &str,
        transport: TransportProfile,
        calendar: TradingCalendar,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let session = SessionManager::new(http.clone(), &base_url, COMPARISON_PAGE);
        Ok(Self {
            base_url,
            http,
            session,
            calendar,
        })
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Runs one logical query and returns the raw `data` rows.
    ///
    /// Candidates for `kind` are tried in priority order; the first
    /// 200 response that parses as JSON with a `data` array wins. An
    /// empty array is returned as-is (market-holiday data gap, not a
    /// failure). A non-200 status, an HTML body, or a timeout is
    /// treated as session-shaped: the session is refreshed once and
    /// the same candidate retried once before moving on. A TLS or
    /// connect failure surfaces immediately as
    /// [`Error::TransportNegotiation`] — that is an outage, and no
    /// amount of session churn fixes it.
    pub async fn execute(&self, kind: QueryKind, params: &QueryParams) -> Result<Vec<Value>, Error> {
        let cx = self.payload_context(kind, params)?;
        let mut session = self.session_with_backoff(None).await?;
        let mut attempts: Vec<EndpointAttempt> = Vec::new();

        for spec in candidates(kind) {
            let reason = match self.post_candidate(spec, &cx, &session).await {
                Ok(rows) => {
                    if !attempts.is_empty() {
                        tracing::warn!(
                            %kind,
                            endpoint = spec.name,
                            skipped = attempts.len(),
                            "fell back to lower-priority endpoint"
                        );
                    }
                    return Ok(rows);
                }
                Err(CandidateFailure::Fatal(msg)) => {
                    return Err(Error::TransportNegotiation(msg));
                }
                Err(CandidateFailure::SessionShaped(reason)) => reason,
            };

            tracing::warn!(
                %kind,
                endpoint = spec.name,
                %reason,
                "session-shaped failure, refreshing session and retrying candidate"
            );
            session = self.session_with_backoff(Some(&session)).await?;

            match self.post_candidate(spec, &cx, &session).await {
                Ok(rows) => return Ok(rows),
                Err(CandidateFailure::Fatal(msg)) => {
                    return Err(Error::TransportNegotiation(msg));
                }
                Err(CandidateFailure::SessionShaped(retry_reason)) => {
                    attempts.push(EndpointAttempt {
                        endpoint: spec.name,
                        reason: format!("{reason}; after session refresh: {retry_reason}"),
                    });
                }
            }
        }

        Err(Error::NoUsableEndpoint { kind, attempts })
    }

    fn payload_context(&self, kind: QueryKind, params: &QueryParams) -> Result<PayloadContext, Error> {
        let (start, end) = match kind {
            QueryKind::History => {
                let (from, to) = params
                    .range
                    .unwrap_or_else(|| (self.default_as_of(params), self.default_as_of(params)));
                self.calendar.resolve_range(from, to)?
            }
            _ => {
                let as_of = self.default_as_of(params);
                (as_of, as_of)
            }
        };
        Ok(PayloadContext {
            start,
            end,
            fund_code: params.fund_code.clone(),
        })
    }

    fn default_as_of(&self, params: &QueryParams) -> NaiveDate {
        match params.as_of {
            Some(requested) => self.calendar.resolve_as_of(requested),
            None => self.calendar.resolve_today(),
        }
    }

    /// Session acquisition with capped exponential backoff and jitter.
    /// Covers both the initial acquire and mid-walk refreshes (pass
    /// the stale session for the latter). Bounded at
    /// [`BOOTSTRAP_ATTEMPTS`]; acquisition failures are never looped
    /// indefinitely.
    async fn session_with_backoff(&self, stale: Option<&Session>) -> Result<Session, Error> {
        let mut last_err = None;
        for attempt in 0..BOOTSTRAP_ATTEMPTS {
            if attempt > 0 {
                let backoff = BOOTSTRAP_BACKOFF_BASE * 2u32.pow(attempt - 1);
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
                tokio::time::sleep(backoff + jitter).await;
            }
            let result = match stale {
                Some(stale) => self.session.refresh(stale).await,
                None => self.session.acquire().await,
            };
            match result {
                Ok(session) => return Ok(session),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "session acquisition failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::SessionAcquisition("session acquisition never attempted".to_string())
        }))
    }

    async fn post_candidate(
        &self,
        spec: &EndpointSpec,
        cx: &PayloadContext,
        session: &Session,
    ) -> Result<Vec<Value>, CandidateFailure> {
        let url = format!("{}{}", self.base_url, spec.path());
        let referer = format!("{}{}", self.base_url, spec.referer_path);
        tracing::debug!(endpoint = spec.name, %url, "posting data query");

        let resp = self
            .http
            .post(&url)
            .form(&spec.build_payload(cx))
            .header(
                "content-type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .header("x-requested-with", "XMLHttpRequest")
            .header("accept", "application/json, text/javascript, */*; q=0.01")
            .header("origin", self.base_url.as_str())
            .header("referer", referer)
            .header("cookie", session.cookie.as_str())
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CandidateFailure::SessionShaped(format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(CandidateFailure::SessionShaped(format!("status {status}")));
        }

        match serde_json::from_str::<DataEnvelope>(&body) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) => Err(CandidateFailure::SessionShaped(format!(
                "body is not a JSON data envelope ({e}): {}",
                truncate_body(&body)
            ))),
        }
    }
}

/// The portal's grid envelope. Extra fields like `recordsTotal` are
/// ignored; a body without a `data` array (the HTML error page) fails
/// to parse and counts as session-shaped.
#[derive(Deserialize)]
struct DataEnvelope {
    data: Vec<Value>,
}

enum CandidateFailure {
    /// TLS/connect failure despite the compatibility profile. Outage;
    /// surfaced without further retries.
    Fatal(String),
    /// Anything the portal answers when it no longer accepts the
    /// session or the endpoint: non-200, HTML body, timeout.
    SessionShaped(String),
}

fn classify_send_error(e: reqwest::Error) -> CandidateFailure {
    if e.is_connect() {
        CandidateFailure::Fatal(format!("connect/handshake failed: {e}"))
    } else {
        CandidateFailure::SessionShaped(format!("request failed: {e}"))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        return body.to_string();
    }
    // The error pages are Turkish; cut on a char boundary.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

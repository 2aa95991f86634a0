//! Session-cookie acquisition and single-flight refresh.
//!
//! The portal hands out its session through `Set-Cookie` on the
//! comparison page; there is no login and no advertised expiry.
//! Staleness is only ever observed reactively, when a data POST comes
//! back session-shaped (non-200, or HTML where JSON was expected), so
//! the manager's job is to bootstrap on demand and make sure that N
//! callers discovering staleness at once produce one bootstrap GET,
//! not N.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use reqwest::header::SET_COOKIE;
use tokio::sync::Mutex;

use crate::Error;

/// An acquired portal session. Opaque cookie header value plus
/// bookkeeping; never persisted across process restarts.
#[derive(Debug, Clone)]
pub struct Session {
    /// Joined `name=value` pairs ready for the `Cookie` header.
    pub cookie: String,
    pub acquired_at: Instant,
    /// Which bootstrap attempt produced this session (1-based).
    pub attempt: u32,
}

/// Owns the process-wide session cookie for one portal base URL.
pub struct SessionManager {
    http: reqwest::Client,
    bootstrap_url: String,
    current: Mutex<Option<Session>>,
    attempts: AtomicU32,
}

impl SessionManager {
    /// `bootstrap_path` is the portal page whose response carries the
    /// `Set-Cookie` headers (the comparison page in production).
    pub fn new(http: reqwest::Client, base_url: &str, bootstrap_path: &str) -> Self {
        Self {
            http,
            bootstrap_url: format!("{}{}", base_url.trim_end_matches('/'), bootstrap_path),
            current: Mutex::new(None),
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns the cached session, bootstrapping one first if none
    /// exists. Concurrent callers serialize on the internal lock and
    /// share the single bootstrap result.
    pub async fn acquire(&self) -> Result<Session, Error> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            return Ok(session.clone());
        }
        let session = self.bootstrap().await?;
        *current = Some(session.clone());
        Ok(session)
    }

    /// Staleness recovery: replaces `stale` with a fresh session. If
    /// another caller already refreshed while we were observing the
    /// failure, their session is returned without a network call.
    pub async fn refresh(&self, stale: &Session) -> Result<Session, Error> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            // The bootstrap attempt number identifies the session; the
            // portal can hand out the same cookie value twice.
            if session.attempt != stale.attempt {
                return Ok(session.clone());
            }
        }
        *current = None;
        let session = self.bootstrap().await?;
        *current = Some(session.clone());
        Ok(session)
    }

    /// Drops the cached session if `stale` is still the current one.
    pub async fn invalidate(&self, stale: &Session) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|s| s.attempt == stale.attempt) {
            *current = None;
        }
    }

    /// How many bootstrap GETs have been issued over the manager's
    /// lifetime. Exposed for diagnostics and tests.
    pub fn bootstrap_count(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    async fn bootstrap(&self) -> Result<Session, Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(attempt, url = %self.bootstrap_url, "bootstrapping portal session");

        let resp = self
            .http
            .get(&self.bootstrap_url)
            .header("accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| Error::SessionAcquisition(format!("bootstrap GET failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SessionAcquisition(format!(
                "bootstrap GET returned status {status}"
            )));
        }

        let cookie = join_cookies(
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        if cookie.is_empty() {
            return Err(Error::SessionAcquisition(
                "portal returned no Set-Cookie headers".to_string(),
            ));
        }

        Ok(Session {
            cookie,
            acquired_at: Instant::now(),
            attempt,
        })
    }
}

/// Joins raw `Set-Cookie` values into one `Cookie` header: keeps the
/// leading `name=value` of each, strips attributes like `Path` and
/// `HttpOnly`.
fn join_cookies<'a>(headers: impl Iterator<Item = &'a str>) -> String {
    headers
        .filter_map(|h| {
            let pair = h.split(';').next()?.trim();
            if pair.contains('=') {
                Some(pair.to_string())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

//! Transport compatibility profile for the TEFAS host.
//!
//! The portal's TLS stack predates modern client defaults: it rejects
//! handshakes that do not offer legacy cipher suites, negotiates down
//! to TLS 1.0, and presents a certificate chain that trips strict
//! validation. The profile below is applied to a dedicated
//! `reqwest::Client` owned by this crate and pointed only at the
//! configured TEFAS base URL. It is never installed process-wide;
//! traffic to any other host keeps the default settings.

use std::time::Duration;

use crate::user_agent::get_user_agent;
use crate::Error;

/// Default timeout for the bootstrap GET and each data POST.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Compatibility settings needed to complete a handshake with the
/// portal.
#[derive(Debug, Clone, Copy)]
pub struct TransportProfile {
    timeout: Duration,
}

impl Default for TransportProfile {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportProfile {
    /// Overrides the per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Builds the host-scoped HTTP client: native TLS with the version
    /// floor lowered to 1.0, relaxed certificate validation, gzip, and
    /// a randomized browser user agent. Cookies are managed manually
    /// by the session layer, not by a cookie store.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .use_native_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_0)
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .user_agent(get_user_agent())
            .build()
            .map_err(|e| Error::TransportNegotiation(format!("building HTTP client: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

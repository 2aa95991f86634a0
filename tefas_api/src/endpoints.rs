//! Curated endpoint table for the TEFAS `api/DB` surface.
//!
//! The portal documents none of these endpoints and has renamed or
//! retired them before without notice, so each logical query maps to
//! an *ordered* candidate list that the data client walks until one
//! answers with usable JSON. The names and form fields below are
//! curated configuration from prior investigation against the live
//! portal, not stable contracts; runtime discovery of new names is
//! deliberately not a code path.

use std::fmt;

use chrono::NaiveDate;

/// The comparison page. Both the session bootstrap GET and the
/// `Referer` of the comparison-grid endpoints point here.
pub const COMPARISON_PAGE: &str = "/FonKarsilastirma.aspx";

/// The historical-data page, used as `Referer` by the history and
/// allocation endpoints.
pub const HISTORY_PAGE: &str = "/TarihselVeriler.aspx";

/// A logical query against the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Per-horizon return percentages for the whole fund universe.
    CurrentReturns,
    /// AUM and units outstanding for the whole fund universe.
    CurrentSizes,
    /// Unit-price series for one fund over a date range.
    History,
    /// Portfolio asset-class breakdown for one fund.
    PieAllocation,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::CurrentReturns => "current-returns",
            QueryKind::CurrentSizes => "current-sizes",
            QueryKind::History => "history",
            QueryKind::PieAllocation => "pie-allocation",
        };
        write!(f, "{name}")
    }
}

/// Resolved parameters a payload builder works from.
#[derive(Debug, Clone)]
pub struct PayloadContext {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Required by the per-fund endpoints; the comparison grids return
    /// the whole universe and ignore it.
    pub fund_code: Option<String>,
}

impl PayloadContext {
    fn start_str(&self) -> String {
        self.start.format("%d.%m.%Y").to_string()
    }

    fn end_str(&self) -> String {
        self.end.format("%d.%m.%Y").to_string()
    }

    fn fund_code_str(&self) -> String {
        self.fund_code.clone().unwrap_or_default()
    }
}

/// One candidate endpoint: a name under `/api/DB/`, the page the
/// portal expects as `Referer`, and a deterministic form-payload
/// builder. Position in the [`candidates`] slice is fallback priority.
pub struct EndpointSpec {
    pub name: &'static str,
    pub referer_path: &'static str,
    payload: fn(&PayloadContext) -> Vec<(&'static str, String)>,
}

impl EndpointSpec {
    pub fn path(&self) -> String {
        format!("/api/DB/{}", self.name)
    }

    /// Builds the `application/x-www-form-urlencoded` field list.
    pub fn build_payload(&self, cx: &PayloadContext) -> Vec<(&'static str, String)> {
        (self.payload)(cx)
    }
}

impl fmt::Debug for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSpec")
            .field("name", &self.name)
            .field("referer_path", &self.referer_path)
            .finish()
    }
}

fn comparison_returns_payload(cx: &PayloadContext) -> Vec<(&'static str, String)> {
    vec![
        ("calismatipi", "2".to_string()),
        ("fontip", "YAT".to_string()),
        ("sfontur", String::new()),
        ("kurucukod", String::new()),
        ("fongrup", String::new()),
        ("bastarih", cx.start_str()),
        ("bittarih", cx.end_str()),
        ("fonturkod", String::new()),
        ("fonunvantip", String::new()),
        // One flag per return-horizon column of the grid.
        ("strperiod", "1,1,1,1,1,1,1".to_string()),
        ("islemdurum", "1".to_string()),
    ]
}

fn comparison_sizes_payload(cx: &PayloadContext) -> Vec<(&'static str, String)> {
    vec![
        ("calismatipi", "1".to_string()),
        ("fontip", "YAT".to_string()),
        ("sfontur", String::new()),
        ("kurucukod", String::new()),
        ("fongrup", String::new()),
        ("bastarih", cx.start_str()),
        ("bittarih", cx.end_str()),
        ("fonturkod", String::new()),
        ("fonunvantip", String::new()),
        ("islemdurum", "1".to_string()),
    ]
}

fn history_payload(cx: &PayloadContext) -> Vec<(&'static str, String)> {
    vec![
        ("fontip", "YAT".to_string()),
        ("sfontur", String::new()),
        ("fonkod", cx.fund_code_str()),
        ("fongrup", String::new()),
        ("bastarih", cx.start_str()),
        ("bittarih", cx.end_str()),
        ("fonturkod", String::new()),
        ("fonunvantip", String::new()),
    ]
}

static CURRENT_RETURNS: [EndpointSpec; 2] = [
    EndpointSpec {
        name: "BindComparisonFundReturns",
        referer_path: COMPARISON_PAGE,
        payload: comparison_returns_payload,
    },
    // Older grid name, still answered by some portal releases.
    EndpointSpec {
        name: "BindComparisonFonReturns",
        referer_path: COMPARISON_PAGE,
        payload: comparison_returns_payload,
    },
];

static CURRENT_SIZES: [EndpointSpec; 2] = [
    EndpointSpec {
        name: "BindComparisonFundSizes",
        referer_path: COMPARISON_PAGE,
        payload: comparison_sizes_payload,
    },
    EndpointSpec {
        name: "BindComparisonFonSizes",
        referer_path: COMPARISON_PAGE,
        payload: comparison_sizes_payload,
    },
];

static HISTORY: [EndpointSpec; 1] = [EndpointSpec {
    name: "BindHistoryInfo",
    referer_path: HISTORY_PAGE,
    payload: history_payload,
}];

static PIE_ALLOCATION: [EndpointSpec; 1] = [EndpointSpec {
    name: "BindHistoryAllocation",
    referer_path: HISTORY_PAGE,
    payload: history_payload,
}];

/// Ordered fallback candidates for a query kind. First entry is the
/// preferred endpoint; later entries are tried only after it fails.
pub fn candidates(kind: QueryKind) -> &'static [EndpointSpec] {
    match kind {
        QueryKind::CurrentReturns => &CURRENT_RETURNS,
        QueryKind::CurrentSizes => &CURRENT_SIZES,
        QueryKind::History => &HISTORY,
        QueryKind::PieAllocation => &PIE_ALLOCATION,
    }
}

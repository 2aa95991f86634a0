mod calendar;
mod client;
mod endpoints;
mod errors;
mod normalize;
mod session;
mod transport;
pub mod types;
pub mod user_agent;

pub use self::calendar::{parse_date, TradingCalendar};
pub use self::client::{FundDataClient, QueryParams};
pub use self::endpoints::{candidates, EndpointSpec, PayloadContext, QueryKind};
pub use self::errors::{EndpointAttempt, Error};
pub use self::normalize::{
    normalize_allocations, normalize_history, normalize_snapshots,
};
pub use self::session::{Session, SessionManager};
pub use self::transport::TransportProfile;

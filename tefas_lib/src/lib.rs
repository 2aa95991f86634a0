pub mod cache;
mod error;
mod service;

pub use self::error::TefasError;
pub use self::service::FundDataService;

pub use tefas_api::types;
pub use tefas_api::{parse_date, QueryKind, TradingCalendar};

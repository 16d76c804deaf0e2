pub mod client;
mod csv;
pub mod error;
pub mod rate;
pub mod rate_provider;
pub mod sheet;

pub use client::build_http_client;
pub use error::ScraperError;
pub use rate::{extract_bcv_rate, BcvRateSource, RateSource};
pub use rate_provider::{RateOrigin, RateProvider, RateQuote, RateSettings};
pub use sheet::{CachedCatalog, SheetClient};

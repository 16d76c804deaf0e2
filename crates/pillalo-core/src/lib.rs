pub mod app_config;
pub mod cart;
pub mod catalog;
mod config;
pub mod events;
pub mod listing;
pub mod order;
pub mod pricing;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use cart::{CartError, CartLine, CartState};
pub use catalog::{price_listings, search, search_priced, CatalogPage, CatalogReport, PricedListing};
pub use config::{load_app_config, load_app_config_from_env, sheet_export_url};
pub use events::{EventKind, EventLog, UsageStats};
pub use listing::{Listing, ListingError};
pub use order::{cart_order_links, order_link, SellerOrder};
pub use pricing::{normalize_price, parse_price, to_local, PriceError, PriceQuote};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

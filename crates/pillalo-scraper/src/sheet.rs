//! Catalog loading from the Google Sheets CSV export.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pillalo_core::Listing;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::client::fetch_text;
use crate::csv::parse_csv;
use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Store,
    Zone,
    Price,
    WhatsApp,
    Category,
    Image,
    Priority,
}

/// Maps a header cell to a column. Matching ignores case, surrounding
/// whitespace and the accent in `Categoría`.
fn column_for_header(header: &str) -> Option<Column> {
    let key = header.trim().to_lowercase().replace('í', "i");
    match key.as_str() {
        "producto" => Some(Column::Name),
        "tienda" => Some(Column::Store),
        "zona" => Some(Column::Zone),
        "precio" => Some(Column::Price),
        "whatsapp" => Some(Column::WhatsApp),
        "categoria" => Some(Column::Category),
        "imagen" => Some(Column::Image),
        "prioridad" => Some(Column::Priority),
        _ => None,
    }
}

/// Converts parsed CSV rows (header first) into listings.
///
/// Unknown columns are ignored. Rows with a blank `Producto` are skipped.
///
/// # Errors
///
/// Returns [`ScraperError::MissingColumn`] if `Producto` or `Precio` is absent.
pub(crate) fn listings_from_rows(rows: Vec<Vec<String>>) -> Result<Vec<Listing>, ScraperError> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let columns: Vec<Option<Column>> = header.iter().map(|h| column_for_header(h)).collect();
    for (required, name) in [(Column::Name, "Producto"), (Column::Price, "Precio")] {
        if !columns.contains(&Some(required)) {
            return Err(ScraperError::MissingColumn { column: name });
        }
    }

    let mut listings = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let mut listing = Listing {
            name: String::new(),
            store: String::new(),
            zone: String::new(),
            price_raw: String::new(),
            whatsapp: String::new(),
            category: None,
            image_url: None,
            priority: None,
        };

        for (cell, column) in row.into_iter().zip(columns.iter()) {
            let value = cell.trim();
            let optional = || Some(value.to_owned()).filter(|v| !v.is_empty());
            match column {
                Some(Column::Name) => listing.name = value.to_owned(),
                Some(Column::Store) => listing.store = value.to_owned(),
                Some(Column::Zone) => listing.zone = value.to_owned(),
                Some(Column::Price) => listing.price_raw = value.to_owned(),
                Some(Column::WhatsApp) => listing.whatsapp = value.to_owned(),
                Some(Column::Category) => listing.category = optional(),
                Some(Column::Image) => listing.image_url = optional(),
                Some(Column::Priority) => listing.priority = value.parse().ok(),
                None => {}
            }
        }

        if listing.name.is_empty() {
            skipped += 1;
            continue;
        }
        listings.push(listing);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped sheet rows without a product name");
    }

    Ok(listings)
}

/// Reads the catalog sheet through its CSV export URL.
pub struct SheetClient {
    client: Client,
    url: String,
}

impl SheetClient {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Downloads and parses every listing in the sheet.
    ///
    /// # Errors
    ///
    /// Propagates HTTP failures, malformed CSV and missing required columns.
    pub async fn fetch_listings(&self) -> Result<Vec<Listing>, ScraperError> {
        let body = fetch_text(&self.client, &self.url).await?;
        let rows = parse_csv(&body)?;
        listings_from_rows(rows)
    }
}

#[derive(Default)]
struct CatalogState {
    listings: Option<Arc<Vec<Listing>>>,
    fetched_at: Option<Instant>,
}

impl CatalogState {
    fn store(&mut self, fresh: Vec<Listing>) -> Arc<Vec<Listing>> {
        tracing::info!(count = fresh.len(), "catalog refreshed from sheet");
        let fresh = Arc::new(fresh);
        self.listings = Some(Arc::clone(&fresh));
        self.fetched_at = Some(Instant::now());
        fresh
    }
}

/// [`SheetClient`] with a TTL cache in front of it.
///
/// When a refresh fails and an older copy exists, the older copy is served and
/// the failure is logged. Only a failure with nothing cached is returned.
pub struct CachedCatalog {
    client: SheetClient,
    ttl: Duration,
    state: Mutex<CatalogState>,
}

impl CachedCatalog {
    #[must_use]
    pub fn new(client: SheetClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Returns the cached listings, refreshing them if the TTL has passed.
    ///
    /// # Errors
    ///
    /// Returns the fetch error only if no earlier copy is available.
    pub async fn listings(&self) -> Result<Arc<Vec<Listing>>, ScraperError> {
        let mut state = self.state.lock().await;

        if let (Some(listings), Some(fetched_at)) = (&state.listings, state.fetched_at) {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(listings));
            }
        }

        match self.client.fetch_listings().await {
            Ok(fresh) => Ok(state.store(fresh)),
            Err(error) => match &state.listings {
                Some(stale) => {
                    tracing::warn!(%error, "catalog refresh failed, serving previous copy");
                    Ok(Arc::clone(stale))
                }
                None => {
                    tracing::error!(%error, "catalog unavailable");
                    Err(error)
                }
            },
        }
    }

    /// Fetches the sheet now, ignoring the TTL.
    ///
    /// Unlike [`Self::listings`], a failed fetch is returned even when an
    /// older copy exists. That copy stays cached for later readers.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn refresh(&self) -> Result<Arc<Vec<Listing>>, ScraperError> {
        let mut state = self.state.lock().await;
        match self.client.fetch_listings().await {
            Ok(fresh) => Ok(state.store(fresh)),
            Err(error) => {
                tracing::warn!(
                    %error,
                    kept_previous = state.listings.is_some(),
                    "forced catalog refresh failed"
                );
                Err(error)
            }
        }
    }

    /// Forces the next [`Self::listings`] call to hit the sheet.
    pub async fn invalidate(&self) {
        self.state.lock().await.fetched_at = None;
    }
}

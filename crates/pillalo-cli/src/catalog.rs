//! Command handlers for the CLI.
//!
//! Config is loaded only by the handlers that talk to the network, so
//! `normalize --rate` and `check-row --rate` work without a `.env`.

use pillalo_core::pricing::{format_amount, format_bolivares};
use pillalo_core::{AppConfig, Listing, PricedListing};
use pillalo_scraper::{
    build_http_client, BcvRateSource, RateProvider, RateQuote, RateSettings, SheetClient,
};
use reqwest::Client;

fn http_client(config: &AppConfig) -> anyhow::Result<Client> {
    build_http_client(config.request_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}

fn rate_provider(config: &AppConfig, client: Client) -> RateProvider<BcvRateSource> {
    RateProvider::new(
        BcvRateSource::new(client, config.rate_source_url.clone()),
        RateSettings::from_app_config(config),
    )
}

async fn resolve_rate(explicit: Option<f64>) -> anyhow::Result<f64> {
    match explicit {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        Some(rate) => anyhow::bail!("--rate must be a positive number, got {rate}"),
        None => {
            let config = pillalo_core::load_app_config()?;
            let client = http_client(&config)?;
            Ok(rate_provider(&config, client).get_rate().await)
        }
    }
}

fn describe_quote(quote: &RateQuote) -> String {
    let origin = match quote.origin {
        pillalo_scraper::RateOrigin::Live => "live",
        pillalo_scraper::RateOrigin::Cached => "cached",
        pillalo_scraper::RateOrigin::LastKnownGood => "last known good",
        pillalo_scraper::RateOrigin::Fallback => "fallback",
    };
    format!(
        "{} Bs/USD ({origin}, as of {})",
        quote.rate,
        quote.as_of.format("%Y-%m-%d %H:%M UTC")
    )
}

fn print_priced(item: &PricedListing) {
    let l = &item.listing;
    println!("{}", l.name);
    println!("  {} | {}", l.store, l.zone);
    match &item.price_issue {
        None => println!(
            "  ${}  ≈ {}",
            format_amount(item.price.usd),
            format_bolivares(item.price.local)
        ),
        Some(issue) => println!("  precio no disponible ({issue})"),
    }
    if let Some(link) = &item.order_link {
        println!("  {link}");
    }
}

/// Prints the current exchange rate.
///
/// # Errors
///
/// Returns an error if config cannot be loaded or the HTTP client cannot be built.
/// Upstream failures do not error; they print the substituted rate.
pub(crate) async fn run_rate() -> anyhow::Result<()> {
    let config = pillalo_core::load_app_config()?;
    let quote = rate_provider(&config, http_client(&config)?).quote().await;
    println!("{}", describe_quote(&quote));
    Ok(())
}

/// Searches the catalog sheet and prints the cheapest matches first.
///
/// # Errors
///
/// Returns an error if config is invalid or the sheet cannot be read.
pub(crate) async fn run_search(query: &str, limit: usize) -> anyhow::Result<()> {
    let config = pillalo_core::load_app_config()?;
    search_with_config(&config, query, limit).await.map(|_| ())
}

/// Runs a search with one shared HTTP client for the sheet and the rate
/// source. Returns the number of matches.
pub(crate) async fn search_with_config(
    config: &AppConfig,
    query: &str,
    limit: usize,
) -> anyhow::Result<usize> {
    let client = http_client(config)?;
    let provider = rate_provider(config, client.clone());
    let sheet = SheetClient::new(client, config.sheet_url.clone());

    let (listings, quote) = tokio::join!(sheet.fetch_listings(), provider.quote());
    let listings = listings.map_err(|e| anyhow::anyhow!("failed to load catalog sheet: {e}"))?;

    let page = pillalo_core::search_priced(&listings, query, quote.rate);
    if page.items.is_empty() {
        println!("No pillamos nada con \"{query}\". ¡Probá con otra palabra!");
        return Ok(0);
    }

    println!("Tasa: {}\n", describe_quote(&quote));
    for item in page.items.iter().take(limit) {
        print_priced(item);
        println!();
    }

    if page.items.len() > limit {
        println!("… y {} resultados más", page.items.len() - limit);
    }
    if page.report.malformed_prices > 0 {
        tracing::warn!(
            malformed = page.report.malformed_prices,
            "some listings have unreadable prices"
        );
    }

    Ok(page.items.len())
}

/// Normalizes one raw price and prints its USD and VES values.
///
/// # Errors
///
/// Returns an error only if a rate must be fetched and config is invalid.
pub(crate) async fn run_normalize(raw: &str, rate: Option<f64>) -> anyhow::Result<()> {
    if let Err(e) = pillalo_core::parse_price(raw) {
        println!("warning: {e}; treated as 0");
    }
    let rate = resolve_rate(rate).await?;
    let quote = pillalo_core::PriceQuote::from_raw(raw, rate);
    println!(
        "usd={} local={} rate={}",
        format_amount(quote.usd),
        format_amount(quote.local),
        quote.rate
    );
    Ok(())
}

/// Validates a submission line and prints how it would appear in the catalog.
///
/// # Errors
///
/// Returns an error if the line is not a valid submission.
pub(crate) async fn run_check_row(line: &str, rate: Option<f64>) -> anyhow::Result<()> {
    let listing =
        Listing::parse_submission(line).map_err(|e| anyhow::anyhow!("invalid row: {e}"))?;
    let rate = resolve_rate(rate).await?;
    let page = pillalo_core::price_listings([&listing], rate);
    for item in &page.items {
        print_priced(item);
    }
    Ok(())
}

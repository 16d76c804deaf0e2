//! Catalog search and pricing over the listings loaded from the sheet.

use std::cmp::Ordering;

use serde::Serialize;

use crate::listing::Listing;
use crate::order::order_link;
use crate::pricing::{parse_price, PriceError, PriceQuote};

/// A listing with its converted price and WhatsApp link.
#[derive(Debug, Clone, Serialize)]
pub struct PricedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub price: PriceQuote,
    pub order_link: Option<String>,
    /// Why the price cell was replaced with zero, if it was.
    pub price_issue: Option<String>,
}

/// Data-quality counters for one priced result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub total: usize,
    pub empty_prices: usize,
    pub malformed_prices: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub items: Vec<PricedListing>,
    pub report: CatalogReport,
}

/// Case-insensitive substring match on the product name.
///
/// A blank query matches nothing: the catalog asks the visitor what they are
/// looking for instead of dumping every row.
#[must_use]
pub fn search<'a>(listings: &'a [Listing], query: &str) -> Vec<&'a Listing> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    listings
        .iter()
        .filter(|l| l.name.to_lowercase().contains(&needle))
        .collect()
}

/// Prices every listing at `rate` and sorts cheapest first.
///
/// Listings whose price could not be read are kept, priced at zero, and sorted
/// after every listing with a real price. Ties are broken by priority
/// (highest first), then by name.
#[must_use]
pub fn price_listings<'a, I>(listings: I, rate: f64) -> CatalogPage
where
    I: IntoIterator<Item = &'a Listing>,
{
    let mut report = CatalogReport::default();

    let mut items: Vec<PricedListing> = listings
        .into_iter()
        .map(|listing| {
            report.total += 1;
            let (usd, issue) = match parse_price(&listing.price_raw) {
                Ok(value) => (value, None),
                Err(error) => {
                    if error == PriceError::Empty {
                        report.empty_prices += 1;
                        tracing::debug!(product = %listing.name, "listing has no price");
                    } else {
                        report.malformed_prices += 1;
                        tracing::warn!(
                            product = %listing.name,
                            store = %listing.store,
                            %error,
                            "malformed price, listing shown at 0"
                        );
                    }
                    (0.0, Some(error.to_string()))
                }
            };

            PricedListing {
                order_link: order_link(&listing.whatsapp, &listing.name),
                price: PriceQuote::new(usd, rate),
                listing: listing.clone(),
                price_issue: issue,
            }
        })
        .collect();

    items.sort_by(compare_priced);

    CatalogPage { items, report }
}

/// [`search`] followed by [`price_listings`].
#[must_use]
pub fn search_priced(listings: &[Listing], query: &str, rate: f64) -> CatalogPage {
    price_listings(search(listings, query), rate)
}

fn compare_priced(a: &PricedListing, b: &PricedListing) -> Ordering {
    a.price_issue
        .is_some()
        .cmp(&b.price_issue.is_some())
        .then_with(|| a.price.usd.total_cmp(&b.price.usd))
        .then_with(|| b.listing.priority.cmp(&a.listing.priority))
        .then_with(|| a.listing.name.cmp(&b.listing.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(name: &str, price: &str, priority: Option<i32>) -> Listing {
        Listing {
            name: name.to_owned(),
            store: "Candido".to_owned(),
            zone: "Delicias".to_owned(),
            price_raw: price.to_owned(),
            whatsapp: "584121234567".to_owned(),
            category: None,
            image_url: None,
            priority,
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let rows = vec![
            listing("Harina PAN", "1.05", None),
            listing("Batería 12V", "80", None),
        ];
        let hits = search(&rows, "harina");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Harina PAN");

        let hits = search(&rows, "BATERÍA");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let rows = vec![listing("Harina PAN", "1.05", None)];
        assert!(search(&rows, "   ").is_empty());
    }

    #[test]
    fn priced_results_sort_cheapest_first() {
        let rows = vec![
            listing("Harina B", "1,20", None),
            listing("Harina A", "$1.05", None),
            listing("Harina C", "2", None),
        ];
        let page = search_priced(&rows, "harina", 50.0);
        let names: Vec<&str> = page.items.iter().map(|p| p.listing.name.as_str()).collect();
        assert_eq!(names, ["Harina A", "Harina B", "Harina C"]);
        assert!((page.items[0].price.local - 52.5).abs() < 1e-9);
    }

    #[test]
    fn priority_breaks_price_ties() {
        let rows = vec![
            listing("Harina low", "1", Some(1)),
            listing("Harina high", "1", Some(5)),
            listing("Harina none", "1", None),
        ];
        let page = search_priced(&rows, "harina", 1.0);
        let names: Vec<&str> = page.items.iter().map(|p| p.listing.name.as_str()).collect();
        assert_eq!(names, ["Harina high", "Harina low", "Harina none"]);
    }

    #[test]
    fn malformed_prices_are_counted_and_sorted_last() {
        let rows = vec![
            listing("Harina rota", "consultar", None),
            listing("Harina vacia", "", None),
            listing("Harina buena", "3", None),
        ];
        let page = search_priced(&rows, "harina", 10.0);
        assert_eq!(
            page.report,
            CatalogReport {
                total: 3,
                empty_prices: 1,
                malformed_prices: 1
            }
        );
        assert_eq!(page.items[0].listing.name, "Harina buena");
        assert!(page.items[1].price_issue.is_some());
        assert!(page.items[2].price.usd.abs() < f64::EPSILON);
    }

    #[test]
    fn priced_listing_carries_order_link() {
        let rows = vec![listing("Harina", "1", None)];
        let page = search_priced(&rows, "harina", 1.0);
        assert!(page.items[0]
            .order_link
            .as_deref()
            .is_some_and(|l| l.starts_with("https://wa.me/584121234567")));
    }

    #[test]
    fn priced_listing_serializes_flat() {
        let rows = vec![listing("Harina", "1,05", None)];
        let page = search_priced(&rows, "harina", 50.0);
        let json = serde_json::to_value(&page.items[0]).expect("serialize");
        assert_eq!(json["name"], "Harina");
        assert_eq!(json["price_raw"], "1,05");
        assert!(json["price"]["usd"].is_number());
    }
}

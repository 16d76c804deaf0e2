//! WhatsApp deep links. Ordering happens entirely in the chat the link opens.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::cart::{CartLine, CartState};
use crate::pricing::format_amount;

const WHATSAPP_BASE: &str = "https://wa.me";

/// Keeps only the digits of a phone number, e.g. `"+58 412-123.45.67"` →
/// `"584121234567"`. Returns `None` if nothing is left.
#[must_use]
pub fn whatsapp_digits(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn whatsapp_link(digits: &str, text: &str) -> String {
    let encoded = utf8_percent_encode(text, NON_ALPHANUMERIC);
    format!("{WHATSAPP_BASE}/{digits}?text={encoded}")
}

/// Link that opens a chat with the seller about one product.
///
/// Returns `None` when the listing has no usable phone number.
#[must_use]
pub fn order_link(phone: &str, product: &str) -> Option<String> {
    let digits = whatsapp_digits(phone)?;
    Some(whatsapp_link(
        &digits,
        &format!("Hola, vi {product} en Píllalo"),
    ))
}

/// One pre-filled order message per seller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerOrder {
    pub contact: String,
    pub link: String,
    pub item_count: usize,
    pub subtotal_usd: f64,
}

/// Splits a cart by seller and builds an itemized WhatsApp message for each.
///
/// Lines whose contact has no digits are skipped and logged.
#[must_use]
pub fn cart_order_links(cart: &CartState) -> Vec<SellerOrder> {
    let mut by_seller: BTreeMap<String, Vec<&CartLine>> = BTreeMap::new();
    for line in cart.lines() {
        match whatsapp_digits(&line.contact) {
            Some(digits) => by_seller.entry(digits).or_default().push(line),
            None => tracing::warn!(product = %line.name, "cart line has no seller contact"),
        }
    }

    by_seller
        .into_iter()
        .map(|(contact, lines)| {
            let subtotal_usd: f64 = lines.iter().map(|l| l.subtotal()).sum();
            let mut text = String::from("Hola, quiero pedir en Píllalo:");
            for line in &lines {
                let _ = write!(
                    text,
                    "\n- {} x {} (${} c/u)",
                    line.quantity,
                    line.name,
                    format_amount(line.unit_price)
                );
            }
            let _ = write!(text, "\nTotal: ${}", format_amount(subtotal_usd));

            SellerOrder {
                link: whatsapp_link(&contact, &text),
                contact,
                item_count: lines.len(),
                subtotal_usd,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_digits_strips_formatting() {
        assert_eq!(
            whatsapp_digits("+58 412-123.45.67").as_deref(),
            Some("584121234567")
        );
        assert_eq!(whatsapp_digits("sin número"), None);
    }

    #[test]
    fn order_link_encodes_message() {
        let link = order_link("584121234567", "Harina PAN").unwrap();
        assert_eq!(
            link,
            "https://wa.me/584121234567?text=Hola%2C%20vi%20Harina%20PAN%20en%20P%C3%ADllalo"
        );
    }

    #[test]
    fn order_link_without_phone_is_none() {
        assert!(order_link("", "Harina").is_none());
    }

    #[test]
    fn cart_order_links_groups_by_seller() {
        let mut cart = CartState::new();
        cart.add("Arroz", 1.0, "+58 412 0000000", 2).unwrap();
        cart.add("Harina PAN", 1.05, "584120000000", 1).unwrap();
        cart.add("Aceite", 3.5, "584149999999", 1).unwrap();

        let orders = cart_order_links(&cart);
        assert_eq!(orders.len(), 2);

        let first = &orders[0];
        assert_eq!(first.contact, "584120000000");
        assert_eq!(first.item_count, 2);
        assert!((first.subtotal_usd - 3.05).abs() < 1e-9);
        assert!(first.link.starts_with("https://wa.me/584120000000?text="));
        assert!(first.link.contains("Total%3A%20%243%2E05"));

        assert_eq!(orders[1].contact, "584149999999");
    }

    #[test]
    fn cart_order_links_skips_lines_without_contact() {
        let mut cart = CartState::new();
        cart.add("Arroz", 1.0, "n/a", 1).unwrap();
        assert!(cart_order_links(&cart).is_empty());
    }
}

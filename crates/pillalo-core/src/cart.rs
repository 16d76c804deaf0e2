//! Per-session shopping cart.
//!
//! A cart lives only as long as the session that owns it; nothing here is
//! persisted. Lines are keyed by product name, so adding the same product
//! twice bumps its quantity.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("invalid unit price {0}")]
    InvalidPrice(f64),

    #[error("product \"{0}\" is not in the cart")]
    NotInCart(String),

    #[error("product name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub name: String,
    /// Unit price in USD.
    pub unit_price: f64,
    pub quantity: u32,
    /// Seller's WhatsApp number.
    pub contact: String,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CartState {
    lines: BTreeMap<String, CartLine>,
}

impl CartState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `name`. If the product is already in the cart
    /// its quantity is increased and its price and contact are refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for an empty name, a zero quantity, or a negative
    /// or non-finite price.
    pub fn add(
        &mut self,
        name: &str,
        unit_price: f64,
        contact: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CartError::EmptyName);
        }
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err(CartError::InvalidPrice(unit_price));
        }

        self.lines
            .entry(name.to_owned())
            .and_modify(|line| {
                line.quantity = line.quantity.saturating_add(quantity);
                line.unit_price = unit_price;
                contact.clone_into(&mut line.contact);
            })
            .or_insert_with(|| CartLine {
                name: name.to_owned(),
                unit_price,
                quantity,
                contact: contact.to_owned(),
            });
        Ok(())
    }

    /// Sets the quantity of an existing line. Zero removes the line.
    /// `name` is trimmed the same way [`Self::add`] trims it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if `name` has no line.
    pub fn set_quantity(&mut self, name: &str, quantity: u32) -> Result<(), CartError> {
        let name = name.trim();
        if quantity == 0 {
            return self
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| CartError::NotInCart(name.to_owned()));
        }

        let line = self
            .lines
            .get_mut(name)
            .ok_or_else(|| CartError::NotInCart(name.to_owned()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<CartLine> {
        self.lines.remove(name.trim())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines in product-name order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    #[must_use]
    pub fn total_usd(&self) -> f64 {
        self.lines.values().map(CartLine::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_line() {
        let mut cart = CartState::new();
        cart.add("Harina PAN", 1.05, "584120000000", 2).unwrap();
        assert_eq!(cart.len(), 1);
        let line = cart.lines().next().unwrap();
        assert_eq!(line.quantity, 2);
        assert!((cart.total_usd() - 2.10).abs() < 1e-9);
    }

    #[test]
    fn add_existing_product_increments_quantity() {
        let mut cart = CartState::new();
        cart.add("Harina PAN", 1.05, "584120000000", 1).unwrap();
        cart.add("Harina PAN", 1.10, "584120000000", 3).unwrap();
        let line = cart.lines().next().unwrap();
        assert_eq!(line.quantity, 4);
        assert!((line.unit_price - 1.10).abs() < 1e-9);
    }

    #[test]
    fn add_rejects_zero_quantity_and_bad_price() {
        let mut cart = CartState::new();
        assert_eq!(
            cart.add("Arroz", 1.0, "58412", 0),
            Err(CartError::ZeroQuantity)
        );
        assert!(matches!(
            cart.add("Arroz", -1.0, "58412", 1),
            Err(CartError::InvalidPrice(_))
        ));
        assert!(matches!(
            cart.add("Arroz", f64::NAN, "58412", 1),
            Err(CartError::InvalidPrice(_))
        ));
        assert_eq!(cart.add("  ", 1.0, "58412", 1), Err(CartError::EmptyName));
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = CartState::new();
        cart.add("Arroz", 1.0, "58412", 2).unwrap();
        cart.set_quantity("Arroz", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_unknown_product_fails() {
        let mut cart = CartState::new();
        assert_eq!(
            cart.set_quantity("Arroz", 3),
            Err(CartError::NotInCart("Arroz".to_owned()))
        );
    }

    #[test]
    fn lookups_trim_names_like_add() {
        let mut cart = CartState::new();
        cart.add(" Arroz ", 1.0, "58412", 2).unwrap();
        cart.set_quantity("Arroz ", 5).unwrap();
        assert_eq!(cart.lines().next().unwrap().quantity, 5);
        assert!(cart.remove(" Arroz").is_some());
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = CartState::new();
        cart.add("Arroz", 1.0, "58412", 2).unwrap();
        cart.add("Harina", 1.05, "58414", 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.total_usd().abs() < f64::EPSILON);
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fields in a seller submission line:
/// `Producto, Tienda, Zona, Precio, WhatsApp, Categoria`.
pub const SUBMISSION_FIELDS: usize = 6;

/// One catalog row from the sheet.
///
/// Values are kept as the seller typed them; only [`Listing::price_raw`] is
/// interpreted, through [`crate::pricing`]. The sheet may hold duplicate or
/// inconsistent rows and nothing here tries to reconcile them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// `Producto`
    pub name: String,
    /// `Tienda`
    pub store: String,
    /// `Zona`
    pub zone: String,
    /// `Precio`, untouched.
    pub price_raw: String,
    /// `WhatsApp` contact number, in whatever format the seller entered.
    pub whatsapp: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// Higher values sort first among equally priced listings.
    pub priority: Option<i32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("expected {expected} comma-separated fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("field \"{0}\" must not be empty")]
    EmptyField(&'static str),
}

impl Listing {
    /// Parses a seller submission line of the form
    /// `Producto, Tienda, Zona, Precio, WhatsApp, Categoria`.
    ///
    /// Fields are trimmed. A comma-decimal price such as `1,05` would split the
    /// line, so prices in submissions must use a dot.
    ///
    /// # Errors
    ///
    /// - [`ListingError::FieldCount`] when the line does not have exactly six fields.
    /// - [`ListingError::EmptyField`] when the product name is blank.
    pub fn parse_submission(line: &str) -> Result<Self, ListingError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != SUBMISSION_FIELDS {
            return Err(ListingError::FieldCount {
                expected: SUBMISSION_FIELDS,
                actual: fields.len(),
            });
        }

        if fields[0].is_empty() {
            return Err(ListingError::EmptyField("Producto"));
        }

        Ok(Self {
            name: fields[0].to_owned(),
            store: fields[1].to_owned(),
            zone: fields[2].to_owned(),
            price_raw: fields[3].to_owned(),
            whatsapp: fields[4].to_owned(),
            category: Some(fields[5].to_owned()).filter(|c| !c.is_empty()),
            image_url: None,
            priority: None,
        })
    }
}

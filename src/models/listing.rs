use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single marketplace item as returned by a listing source.
///
/// The URL is the identity of a listing. It is used verbatim for deduplication,
/// query strings included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub title: String,
    pub url: String,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
}

impl Listing {
    pub fn new(title: impl Into<String>, url: impl Into<String>, price: Decimal, currency: Option<&str>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            price: Some(price),
            currency: currency.map(str::to_string),
        }
    }

    pub fn currency_or_empty(&self) -> &str {
        self.currency.as_deref().unwrap_or("")
    }
}

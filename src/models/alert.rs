use std::fmt;

use crate::models::{Listing, ProductWatch};

/// Message sent for one listing that matched a product watch.
#[derive(Debug, Clone)]
pub struct PriceAlert<'a> {
    pub watch: &'a ProductWatch,
    pub listing: &'a Listing,
}

impl<'a> PriceAlert<'a> {
    pub fn new(watch: &'a ProductWatch, listing: &'a Listing) -> Self {
        Self { watch, listing }
    }

    /// Telegram-flavoured Markdown body.
    pub fn to_markdown(&self) -> String {
        let price = self
            .listing
            .price
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "🎉 Price Alert for *{name}*! 🎉\n\n\
             Item: *{title}*\n\
             Price: *{price} {currency}* (Target: {target:.2})\n\
             Platform: {platform}\n\
             URL: {url}",
            name = self.watch.name,
            title = self.listing.title,
            price = price,
            currency = self.listing.currency_or_empty(),
            target = self.watch.target_price,
            platform = self.watch.platform.as_str().to_uppercase(),
            url = self.listing.url,
        )
    }
}

/// Out-of-band message sent when the check loop dies.
pub fn failure_message(error: &dyn fmt::Display) -> String {
    format!("Price tracker encountered an error: {}", error)
}

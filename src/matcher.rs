use crate::dedup_store::NotifiedSet;
use crate::models::{Listing, ProductWatch};

/// Listings from one fetch that should trigger a notification for `watch`.
///
/// A listing matches when its URL has not been notified yet, it carries a price,
/// and that price lies in `min_price..=target_price`. Input order is preserved.
pub fn evaluate<'a>(
    watch: &ProductWatch,
    listings: &'a [Listing],
    already_notified: &NotifiedSet,
) -> Vec<&'a Listing> {
    listings
        .iter()
        .filter(|listing| !already_notified.contains(&listing.url))
        .filter(|listing| listing.price.is_some_and(|price| watch.accepts_price(price)))
        .collect()
}

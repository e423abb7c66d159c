use async_trait::async_trait;

use crate::models::{Listing, Platform};
use crate::utils::error::AppError;

/// Trait for marketplaces that can be searched for listings (OLX, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &'static str;
    fn platform(&self) -> Platform;

    /// Run a free-text search. Zero results is `Ok(vec![])`; network and
    /// response-shape failures are errors the caller may downgrade.
    async fn search(&self, query: &str) -> Result<Vec<Listing>, AppError>;
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::Platform;
use crate::utils::error::AppError;

/// A product search as written in the configuration file.
///
/// Every field is optional here so that one malformed entry can be skipped at
/// check time without rejecting the whole configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_price_range"))]
pub struct ProductWatchEntry {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    #[validate(required, length(min = 1))]
    pub platform: Option<String>,
    #[validate(required)]
    pub target_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
}

fn validate_price_range(entry: &ProductWatchEntry) -> Result<(), ValidationError> {
    if let (Some(min), Some(target)) = (entry.min_price, entry.target_price) {
        if min > target {
            return Err(ValidationError::new("min_price_exceeds_target_price"));
        }
    }
    Ok(())
}

/// A validated product search: what to look for, where, and the accepted price range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductWatch {
    pub name: String,
    pub platform: Platform,
    pub target_price: Decimal,
    pub min_price: Decimal,
}

impl ProductWatchEntry {
    /// Validate the entry and resolve its platform.
    ///
    /// Field problems come back as `AppError::Validation`, an unknown platform as
    /// `AppError::UnsupportedPlatform`, so callers can report them differently.
    pub fn to_watch(&self) -> Result<ProductWatch, AppError> {
        self.validate()?;

        let missing = |field: &str| AppError::Validation(format!("{}: required", field));
        let name = self.name.clone().ok_or_else(|| missing("name"))?;
        let platform = self
            .platform
            .as_deref()
            .ok_or_else(|| missing("platform"))?
            .parse::<Platform>()?;
        let target_price = self.target_price.ok_or_else(|| missing("target_price"))?;

        Ok(ProductWatch {
            name,
            platform,
            target_price,
            min_price: self.min_price.unwrap_or(Decimal::ZERO),
        })
    }
}

impl ProductWatch {
    /// Inclusive on both ends.
    pub fn accepts_price(&self, price: Decimal) -> bool {
        self.min_price <= price && price <= self.target_price
    }
}

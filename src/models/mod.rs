use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

pub mod alert;
pub mod listing;
pub mod product_watch;

// Re-exports for convenience
pub use alert::*;
pub use listing::*;
pub use product_watch::*;

/// Marketplaces a product watch can be dispatched to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Olx,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Olx => "olx",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "olx" => Ok(Platform::Olx),
            _ => Err(AppError::UnsupportedPlatform(s.to_string())),
        }
    }
}

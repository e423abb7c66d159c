// Listing source implementations
pub mod olx;

pub use olx::OlxSource;

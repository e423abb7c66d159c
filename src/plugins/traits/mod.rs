pub mod source;
pub mod notifier;

pub use source::ListingSource;
pub use notifier::{Notifier, NotificationResult};

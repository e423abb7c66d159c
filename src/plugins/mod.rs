pub mod traits;
pub mod manager;
pub mod sources;
pub mod notifiers;

pub use manager::PluginManager;
pub use traits::{ListingSource, Notifier};

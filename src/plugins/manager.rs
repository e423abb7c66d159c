use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::sources::OlxSource;
use super::traits::ListingSource;
use crate::config::OlxConfig;
use crate::models::{Listing, Platform};
use crate::utils::error::AppError;

pub type ListingSourceBox = Box<dyn ListingSource>;

/// Registry of listing sources, one per platform.
#[derive(Clone)]
pub struct PluginManager {
    sources: Arc<RwLock<HashMap<Platform, ListingSourceBox>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            sources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a listing source, replacing any previous one for the same platform
    pub async fn register_source(&self, plugin: ListingSourceBox) -> Result<(), AppError> {
        let platform = plugin.platform();
        tracing::debug!("Registering listing source {} for platform {}", plugin.name(), platform);

        let mut sources = self.sources.write().await;
        sources.insert(platform, plugin);
        Ok(())
    }

    /// Check if a source is registered for a platform
    pub async fn has_source(&self, platform: Platform) -> bool {
        let sources = self.sources.read().await;
        sources.contains_key(&platform)
    }

    /// List all platforms with a registered source
    pub async fn list_platforms(&self) -> Vec<Platform> {
        let sources = self.sources.read().await;
        sources.keys().copied().collect()
    }

    /// Register the built-in sources
    pub async fn initialize_default_plugins(&self, olx: &OlxConfig) -> Result<(), AppError> {
        self.register_source(Box::new(OlxSource::new(olx.clone())?)).await?;
        Ok(())
    }

    /// Search a platform through its registered source
    pub async fn search(&self, platform: Platform, query: &str) -> Result<Vec<Listing>, AppError> {
        let sources = self.sources.read().await;
        if let Some(source) = sources.get(&platform) {
            source.search(query).await
        } else {
            Err(AppError::UnsupportedPlatform(platform.to_string()))
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

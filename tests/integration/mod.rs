// Shared fixtures for integration tests

pub mod scheduler_tests;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Arc, Mutex};

use listing_watcher::config::AppConfig;
use listing_watcher::models::{Listing, Platform, ProductWatchEntry};
use listing_watcher::plugins::traits::NotificationResult;
use listing_watcher::plugins::{ListingSource, Notifier, PluginManager};
use listing_watcher::{AppError, DedupStore, Scheduler};

/// Listing source returning a fixed page and recording every query it receives.
pub struct FakeSource {
    pub listings: Arc<Mutex<Vec<Listing>>>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl FakeSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings: Arc::new(Mutex::new(listings)),
            queries: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }
}

#[async_trait]
impl ListingSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake-olx"
    }

    fn platform(&self) -> Platform {
        Platform::Olx
    }

    async fn search(&self, query: &str) -> Result<Vec<Listing>, AppError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(AppError::Parse {
                message: "OLX response format error".to_string(),
            });
        }
        Ok(self.listings.lock().unwrap().clone())
    }
}

/// Notifier recording `(destination, text)` pairs.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub reject: bool,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<NotificationResult, AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        if self.reject {
            Ok(NotificationResult::failed("Forbidden: bot was blocked by the user"))
        } else {
            Ok(NotificationResult::delivered(None))
        }
    }
}

pub fn product(name: &str, min_price: Decimal, target_price: Decimal) -> ProductWatchEntry {
    ProductWatchEntry {
        name: Some(name.to_string()),
        platform: Some("olx".to_string()),
        target_price: Some(target_price),
        min_price: Some(min_price),
    }
}

pub fn listing(url: &str, price: Decimal) -> Listing {
    Listing::new(format!("Listing {}", url), url, price, Some("PLN"))
}

/// Config with usable credentials and the store inside `dir`.
pub fn test_config(dir: &Path, products: Vec<ProductWatchEntry>) -> AppConfig {
    let mut config = AppConfig::default();
    config.telegram.bot_token = Some("123456:ABC".to_string());
    config.telegram.chat_id = Some("987654".to_string());
    config.store.notified_items_file = dir.join("notified_items.json");
    config.products = products;
    config
}

pub async fn build_scheduler(
    config: AppConfig,
    source: FakeSource,
    notifier: RecordingNotifier,
) -> anyhow::Result<Scheduler> {
    let plugins = PluginManager::new();
    plugins.register_source(Box::new(source)).await?;
    let store = DedupStore::new(config.store.notified_items_file.clone());
    Ok(Scheduler::new(config, plugins, Arc::new(notifier), store))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::dedup_store::{DedupStore, NotifiedSet};
use crate::matcher;
use crate::models::{failure_message, Listing, PriceAlert, ProductWatch, ProductWatchEntry};
use crate::plugins::manager::PluginManager;
use crate::plugins::traits::Notifier;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Checking,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    NoProducts,
    MissingCredentials,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Skipped(SkipReason),
}

/// What one pass over the configured products did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub products_checked: usize,
    pub products_skipped: usize,
    pub listings_seen: usize,
    pub matches: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub persisted: bool,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            outcome: CycleOutcome::Completed,
            products_checked: 0,
            products_skipped: 0,
            listings_seen: 0,
            matches: 0,
            notifications_sent: 0,
            notifications_failed: 0,
            persisted: false,
        }
    }
}

/// Why [`Scheduler::run_until`] returned without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Stopped,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub notified_total: usize,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Drives the check cycle: fetch every configured product, match, notify, persist.
///
/// The notified set is loaded once by [`Scheduler::start`] and kept in memory for the
/// lifetime of the scheduler.
pub struct Scheduler {
    config: AppConfig,
    plugins: PluginManager,
    notifier: Arc<dyn Notifier>,
    store: DedupStore,
    notified: NotifiedSet,
    state: SchedulerState,
    stats: SchedulerStats,
    started: bool,
}

impl Scheduler {
    pub fn new(
        config: AppConfig,
        plugins: PluginManager,
        notifier: Arc<dyn Notifier>,
        store: DedupStore,
    ) -> Self {
        Self {
            config,
            plugins,
            notifier,
            store,
            notified: NotifiedSet::new(),
            state: SchedulerState::Idle,
            stats: SchedulerStats::default(),
            started: false,
        }
    }

    /// Load the notified set from the dedup store.
    pub async fn start(&mut self) {
        self.notified = self.store.load().await;
        self.stats.notified_total = self.notified.len();
        self.started = true;
        info!(
            "Loaded {} notified items from {}",
            self.notified.len(),
            self.store.path().display()
        );
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Run cycles until `shutdown` resolves or a cycle fails.
    ///
    /// The interval is measured from the end of one cycle to the start of the next.
    /// A failed cycle ends the loop after a best-effort failure notification.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<RunOutcome, AppError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if !self.started {
            self.start().await;
        }

        let interval_secs = self.config.scheduler.check_interval_secs;
        info!("Price checker started. Will check prices every {} seconds.", interval_secs);

        loop {
            let result = tokio::select! {
                result = self.run_cycle() => result,
                _ = &mut shutdown => {
                    self.state = SchedulerState::Idle;
                    info!("Price checker stopped by user.");
                    return Ok(RunOutcome::Stopped);
                }
            };

            if let Err(e) = result {
                error!("An unexpected error occurred in the main loop: {}", e);
                self.notify_failure(&e).await;
                return Err(e);
            }

            info!("Next check in {} seconds...", interval_secs);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {}
                _ = &mut shutdown => {
                    info!("Price checker stopped by user.");
                    return Ok(RunOutcome::Stopped);
                }
            }
        }
    }

    /// Run a single cycle, loading the store first if needed.
    pub async fn run_once(&mut self) -> Result<CycleReport, AppError> {
        if !self.started {
            self.start().await;
        }

        match self.run_cycle().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Price check failed: {}", e);
                self.notify_failure(&e).await;
                Err(e)
            }
        }
    }

    /// One pass over all configured products.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, AppError> {
        self.state = SchedulerState::Checking;
        let result = self.check_all().await;
        self.state = SchedulerState::Idle;

        let report = result?;
        metrics::counter!("watcher_cycles_total").increment(1);

        match report.outcome {
            CycleOutcome::Completed => self.stats.cycles_completed += 1,
            CycleOutcome::Skipped(_) => self.stats.cycles_skipped += 1,
        }
        self.stats.notifications_sent += report.notifications_sent as u64;
        self.stats.notifications_failed += report.notifications_failed as u64;
        self.stats.notified_total = self.notified.len();
        self.stats.last_cycle_at = Some(Utc::now());

        Ok(report)
    }

    async fn check_all(&mut self) -> Result<CycleReport, AppError> {
        let mut report = CycleReport::new();

        if self.config.products.is_empty() {
            warn!("No products configured. Please add [[products]] entries to the configuration file.");
            report.outcome = CycleOutcome::Skipped(SkipReason::NoProducts);
            return Ok(report);
        }

        if !self.config.telegram.is_configured() {
            warn!("Telegram bot token or chat ID is not configured correctly. Please update these values to enable notifications.");
            report.outcome = CycleOutcome::Skipped(SkipReason::MissingCredentials);
            return Ok(report);
        }

        if self.config.scheduler.reload_each_cycle {
            let on_disk = self.store.load().await;
            self.notified.merge(on_disk);
        }

        info!("Starting price check...");

        let mut session = NotifiedSet::new();
        for entry in &self.config.products {
            self.check_product(entry, &mut session, &mut report).await;
        }

        if !session.is_empty() {
            self.notified.merge(session);
            self.store.save(&self.notified).await?;
            report.persisted = true;
            info!("Updated notified items file: {}", self.store.path().display());
        }

        info!(
            checked = report.products_checked,
            skipped = report.products_skipped,
            matches = report.matches,
            sent = report.notifications_sent,
            failed = report.notifications_failed,
            "Price check finished."
        );
        Ok(report)
    }

    async fn check_product(
        &self,
        entry: &ProductWatchEntry,
        session: &mut NotifiedSet,
        report: &mut CycleReport,
    ) {
        let watch = match entry.to_watch() {
            Ok(watch) => watch,
            Err(AppError::UnsupportedPlatform(platform)) => {
                warn!("Platform '{}' is not yet supported.", platform);
                report.products_skipped += 1;
                return;
            }
            Err(e) => {
                warn!("Skipping invalid product configuration {:?}: {}", entry, e);
                report.products_skipped += 1;
                return;
            }
        };

        if !self.plugins.has_source(watch.platform).await {
            warn!("Platform '{}' is not yet supported.", watch.platform);
            report.products_skipped += 1;
            return;
        }

        info!(
            "Checking '{}' on '{}' (Target price: {}, Min price: {})...",
            watch.name, watch.platform, watch.target_price, watch.min_price
        );

        report.products_checked += 1;
        let listings = self.fetch(&watch).await;
        if listings.is_empty() {
            info!("No items found for '{}' on '{}'.", watch.name, watch.platform);
            return;
        }

        report.listings_seen += listings.len();
        info!("Found {} items for '{}'. Analyzing prices...", listings.len(), watch.name);

        let chat_id = self.config.telegram.chat_id.as_deref().unwrap_or_default();

        for listing in matcher::evaluate(&watch, &listings, &self.notified) {
            // Same listing surfaced by another product earlier in this cycle.
            if session.contains(&listing.url) {
                debug!("Already notified this cycle: {}", listing.url);
                continue;
            }

            report.matches += 1;
            info!(
                "Found matching item: {} at {}",
                listing.title,
                listing.price.unwrap_or_default()
            );

            let message = PriceAlert::new(&watch, listing).to_markdown();
            match self.notifier.send(chat_id, &message).await {
                Ok(result) if result.success => {
                    report.notifications_sent += 1;
                    metrics::counter!("watcher_notifications_total", "status" => "sent").increment(1);
                }
                Ok(result) => {
                    warn!(
                        "Error sending {} message: {}",
                        self.notifier.name(),
                        result.error.unwrap_or_default()
                    );
                    report.notifications_failed += 1;
                    metrics::counter!("watcher_notifications_total", "status" => "failed").increment(1);
                }
                Err(e) => {
                    warn!("Error sending {} message: {}", self.notifier.name(), e);
                    report.notifications_failed += 1;
                    metrics::counter!("watcher_notifications_total", "status" => "failed").increment(1);
                }
            }

            // Marked regardless of delivery; a failed alert is not retried.
            session.insert(listing.url.clone());
        }
    }

    /// Search with a deadline. Errors and timeouts count as "no listings".
    async fn fetch(&self, watch: &ProductWatch) -> Vec<Listing> {
        let seconds = self.config.scheduler.fetch_timeout_secs;
        let search = self.plugins.search(watch.platform, &watch.name);

        let error = match tokio::time::timeout(Duration::from_secs(seconds), search).await {
            Ok(Ok(listings)) => return listings,
            Ok(Err(e)) => e,
            Err(_) => AppError::Timeout {
                operation: format!("search '{}' on {}", watch.name, watch.platform),
                seconds,
            },
        };

        warn!("Error fetching {} data for '{}': {}", watch.platform, watch.name, error);
        metrics::counter!("watcher_fetch_errors_total").increment(1);
        Vec::new()
    }

    async fn notify_failure(&self, error: &AppError) {
        if !self.config.telegram.is_configured() {
            return;
        }

        let chat_id = self.config.telegram.chat_id.as_deref().unwrap_or_default();
        match self.notifier.send(chat_id, &failure_message(error)).await {
            Ok(result) if result.success => {}
            Ok(result) => warn!("Could not deliver failure notification: {}", result.error.unwrap_or_default()),
            Err(e) => warn!("Could not deliver failure notification: {}", e),
        }
    }
}

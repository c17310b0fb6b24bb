use crate::cookbook::CookbookStore;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Periodically reloads the cookbook folder so edits show up without a restart
pub struct Reloader {
    store: CookbookStore,
    interval_secs: u64,
}

impl Reloader {
    pub fn new(store: CookbookStore, interval_secs: u64) -> Self {
        Self {
            store,
            interval_secs,
        }
    }

    /// Start the background reload loop
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Cookbook reloader started (interval: {}s, path: {})",
                self.interval_secs,
                self.store.folder().display()
            );

            let mut ticker = interval(Duration::from_secs(self.interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately and the store is already fresh
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.reload_once().await;
            }
        })
    }

    async fn reload_once(&self) {
        match self.store.reload().await {
            Ok(report) => {
                if !report.is_clean() {
                    info!(
                        "Reload finished with {} errors and {} warnings",
                        report.errors.len(),
                        report.warnings.len()
                    );
                }
                report.log();
            }
            Err(e) => error!("Scheduled cookbook reload failed: {}", e.log_safe()),
        }
    }
}

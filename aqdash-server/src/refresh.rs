//! Scheduled feed refresh
//!
//! Keeps the cache warm so page loads rarely wait on the network. A failed
//! refresh is logged and the previous snapshot keeps being served; the next
//! tick tries again.

use std::sync::Arc;
use std::time::Duration;

use aqdash_common::{FeedCache, GetOptions};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Spawn the refresh loop; the first tick fires immediately
pub fn spawn_refresh_task(cache: Arc<FeedCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            refresh_once(&cache).await;
        }
    })
}

/// One forced refresh; returns whether it succeeded
pub async fn refresh_once(cache: &FeedCache) -> bool {
    match cache.get(GetOptions::forced()).await {
        Ok(snapshot) => {
            debug!(sensors = snapshot.sensors.len(), "Scheduled refresh complete");
            true
        }
        Err(e) => {
            warn!(error = %e, "Scheduled refresh failed; serving previous snapshot");
            false
        }
    }
}

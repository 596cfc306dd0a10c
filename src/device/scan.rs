//! Scan-Log Watching
//!
//! Near-real-time view over the device's scan events. The first fetch
//! is loud (logged at info with its outcome); subsequent ticks refresh
//! silently and only bump the last-updated timestamp. The timer is
//! owned here and torn down on stop or drop.

use super::DeviceClient;
use crate::config::{SCAN_POLL_MAX_SECS, SCAN_POLL_MIN_SECS};
use crate::events::{AppEvent, EventBus};
use crate::model::ScanRecord;
use crate::watch::Poller;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Latest snapshot of the scan log.
#[derive(Debug, Clone, Default)]
pub struct ScanLogState {
    pub records: Vec<ScanRecord>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Polls the scan-record proxy on a fixed interval.
pub struct ScanLogWatcher {
    device: Arc<DeviceClient>,
    bus: EventBus,
    poller: Poller,
    state: Arc<RwLock<ScanLogState>>,
    interval: Duration,
    limit: Option<u32>,
}

impl ScanLogWatcher {
    /// `interval_secs` is clamped to the supported 3-60 s range.
    pub fn new(
        device: Arc<DeviceClient>,
        bus: EventBus,
        interval_secs: u64,
        limit: Option<u32>,
    ) -> Self {
        let clamped = interval_secs.clamp(SCAN_POLL_MIN_SECS, SCAN_POLL_MAX_SECS);
        Self {
            device,
            bus,
            poller: Poller::new(),
            state: Arc::new(RwLock::new(ScanLogState::default())),
            interval: Duration::from_secs(clamped),
            limit,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Start polling. The first tick fires immediately. Returns false
    /// when already running; no second timer is created.
    pub fn start(&self) -> bool {
        let device = Arc::clone(&self.device);
        let bus = self.bus.clone();
        let state = Arc::clone(&self.state);
        let limit = self.limit;

        self.poller.start(self.interval, move |n| {
            let device = Arc::clone(&device);
            let bus = bus.clone();
            let state = Arc::clone(&state);
            async move {
                let loud = n == 0;
                match device.scan_records(limit).await {
                    Ok(records) => {
                        if loud {
                            tracing::info!(count = records.len(), "Scan log loaded");
                        } else {
                            tracing::debug!(count = records.len(), "Scan log refreshed");
                        }
                        let now = Utc::now();
                        {
                            let mut s = state.write().await;
                            s.records = records;
                            s.last_updated = Some(now);
                            s.last_error = None;
                        }
                        bus.publish(AppEvent::ScanLogUpdated { at: now });
                    }
                    Err(e) => {
                        if loud {
                            tracing::error!(error = %e, "Scan log load failed");
                        } else {
                            tracing::debug!(error = %e, "Scan log refresh failed");
                        }
                        state.write().await.last_error = Some(e.to_string());
                    }
                }
            }
        })
    }

    /// Stop polling. Returns false when not running.
    pub fn stop(&self) -> bool {
        self.poller.stop()
    }

    /// Latest fetched state.
    pub async fn snapshot(&self) -> ScanLogState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::config::{ApiConfig, DeviceConfig};

    fn watcher(interval_secs: u64) -> ScanLogWatcher {
        let api = Arc::new(ApiClient::new(ApiConfig::default()));
        let device = Arc::new(DeviceClient::new(api, DeviceConfig::default()));
        ScanLogWatcher::new(device, EventBus::default(), interval_secs, Some(50))
    }

    #[test]
    fn test_interval_clamped_to_supported_range() {
        assert_eq!(watcher(1).interval(), Duration::from_secs(3));
        assert_eq!(watcher(600).interval(), Duration::from_secs(60));
        assert_eq!(watcher(15).interval(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_start_twice_keeps_single_timer() {
        let w = watcher(5);
        assert!(w.start());
        assert!(!w.start());
        assert!(w.is_running());
        assert!(w.stop());
        assert!(!w.is_running());
        assert!(!w.stop());
    }

    #[tokio::test]
    async fn test_snapshot_starts_empty() {
        let w = watcher(5);
        let snap = w.snapshot().await;
        assert!(snap.records.is_empty());
        assert!(snap.last_updated.is_none());
    }
}

//! Polling Watchers
//!
//! Central owner for every recurring background fetch. A [`Poller`]
//! runs at most one timer: starting an already-running poller is a
//! no-op, and stopping it cancels the task within one tick. Dropping
//! the poller also stops the task.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct ActivePoll {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Cancellable interval poller.
pub struct Poller {
    active: Mutex<Option<ActivePoll>>,
}

impl Poller {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    /// Whether a timer is currently running.
    pub fn is_running(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Start ticking `tick` at `interval`. The first tick fires
    /// immediately; `tick` receives the zero-based tick index. Returns
    /// false (and starts nothing) when a timer is already running.
    pub fn start<F, Fut>(&self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.active.lock().unwrap();
        if guard.is_some() {
            return false;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut n: u64 = 0;
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        tick(n).await;
                        n += 1;
                    }
                }
            }
        });

        *guard = Some(ActivePoll {
            stop: stop_tx,
            handle,
        });
        true
    }

    /// Stop the running timer. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        let mut guard = self.active.lock().unwrap();
        match guard.take() {
            Some(active) => {
                let _ = active.stop.send(true);
                true
            }
            None => false,
        }
    }

    /// Stop and wait for the task to finish.
    pub async fn shutdown(&self) {
        let active = self.active.lock().unwrap().take();
        if let Some(active) = active {
            let _ = active.stop.send(true);
            let _ = active.handle.await;
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        // Sender drop cancels the task on its next select.
        if let Ok(mut guard) = self.active.lock() {
            guard.take();
        }
    }
}

/// Publishes [`AppEvent::AttendanceRefreshed`] on a fixed interval so
/// attendance views re-fetch while an admin screen is open.
pub struct AttendanceStatusWatcher {
    bus: crate::events::EventBus,
    poller: Poller,
    interval: Duration,
}

impl AttendanceStatusWatcher {
    pub fn new(bus: crate::events::EventBus, interval_secs: u64) -> Self {
        Self {
            bus,
            poller: Poller::new(),
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub fn start(&self) -> bool {
        let bus = self.bus.clone();
        self.poller.start(self.interval, move |_| {
            let bus = bus.clone();
            async move {
                bus.publish(crate::events::AppEvent::AttendanceRefreshed);
            }
        })
    }

    pub fn stop(&self) -> bool {
        self.poller.stop()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_tick(counter: Arc<AtomicUsize>) -> impl FnMut(u64) -> std::future::Ready<()> {
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_double_start_does_not_create_second_timer() {
        let poller = Poller::new();
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(poller.start(Duration::from_millis(20), counting_tick(counter.clone())));
        assert!(!poller.start(Duration::from_millis(1), counting_tick(counter.clone())));
        assert!(poller.is_running());

        // With a 1 ms second timer, the count would explode; at 20 ms
        // it stays small.
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(counter.load(Ordering::SeqCst) <= 5);

        poller.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_halts_within_one_tick() {
        let poller = Poller::new();
        let counter = Arc::new(AtomicUsize::new(0));

        poller.start(Duration::from_millis(20), counting_tick(counter.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);

        assert!(poller.stop());
        assert!(!poller.is_running());
        let at_stop = counter.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(counter.load(Ordering::SeqCst) <= at_stop + 1);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let poller = Poller::new();
        assert!(!poller.stop());
    }

    #[tokio::test]
    async fn test_attendance_watcher_publishes_refresh() {
        let bus = crate::events::EventBus::default();
        let mut rx = bus.subscribe();

        let watcher = AttendanceStatusWatcher::new(bus, 1);
        assert!(watcher.start());
        assert!(!watcher.start());

        // First tick fires immediately.
        assert_eq!(
            rx.recv().await.unwrap(),
            crate::events::AppEvent::AttendanceRefreshed
        );
        watcher.stop();
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let poller = Poller::new();
        let counter = Arc::new(AtomicUsize::new(0));

        poller.start(Duration::from_millis(10), counting_tick(counter.clone()));
        poller.stop();
        assert!(poller.start(Duration::from_millis(10), counting_tick(counter.clone())));
        poller.shutdown().await;
    }
}

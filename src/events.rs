//! Application Events
//!
//! Typed in-process event bus. Components that used to signal each
//! other through ad hoc global events subscribe here instead; payloads
//! are typed and publishing never blocks.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Events published across component boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Attendance data changed; views holding attendance lists should
    /// re-fetch.
    AttendanceRefreshed,
    /// Pending-request counts changed (a request was decided or
    /// submitted).
    NotificationsChanged,
    /// A scan-log poll completed.
    ScanLogUpdated { at: DateTime<Utc> },
}

/// Broadcast bus for [`AppEvent`]. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events. A slow subscriber that falls
    /// behind the channel capacity misses events rather than stalling
    /// publishers.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns the number of subscribers reached;
    /// zero subscribers is not an error.
    pub fn publish(&self, event: AppEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(AppEvent::AttendanceRefreshed), 1);
        assert_eq!(rx.recv().await.unwrap(), AppEvent::AttendanceRefreshed);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(AppEvent::NotificationsChanged), 0);
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_events() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(AppEvent::NotificationsChanged);
        assert_eq!(a.recv().await.unwrap(), AppEvent::NotificationsChanged);
        assert_eq!(b.recv().await.unwrap(), AppEvent::NotificationsChanged);
    }
}

//! # Notifier
//!
//! The seam between business services and push delivery.
//!
//! ```text
//!   service ── notify(event) ──► BroadcastNotifier ──► broadcast::Sender
//!                                                        │   │   │
//!                                              WsHub conn ◄──┘   │   └──► MirrorCache invalidator
//!                                                      WsHub conn
//! ```
//!
//! Delivery is best-effort. With nobody listening an event is simply
//! dropped; a slow subscriber skips what it missed.

use std::fmt;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::NotifyResult;
use crate::event::{MenuEvent, Notification};

/// Default capacity of the fan-out channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Anything that can announce a [`MenuEvent`].
///
/// Returns how many subscribers received it.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, event: MenuEvent) -> NotifyResult<usize>;
}

/// Publishes `event`, logging instead of failing.
///
/// Called after a write has committed, so there is nothing to undo.
pub fn notify_best_effort(notifier: &dyn Notifier, event: MenuEvent) {
    let kind = event.kind();
    match notifier.notify(event) {
        Ok(delivered) => debug!(event = kind, delivered, "Notification published"),
        Err(e) => warn!(event = kind, error = %e, "Notification failed"),
    }
}

/// In-process fan-out over a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        BroadcastNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        BroadcastNotifier::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: MenuEvent) -> NotifyResult<usize> {
        match self.tx.send(Notification::new(event)) {
            Ok(delivered) => Ok(delivered),
            // No receivers right now
            Err(_) => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::event::CatalogChange;

    #[derive(Debug)]
    struct Broken;

    impl Notifier for Broken {
        fn notify(&self, _event: MenuEvent) -> NotifyResult<usize> {
            Err(NotifyError::ChannelClosed)
        }
    }

    #[test]
    fn test_no_subscribers_is_not_an_error() {
        let notifier = BroadcastNotifier::new(4);
        assert_eq!(notifier.notify(MenuEvent::order_deleted("o")).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let notifier = BroadcastNotifier::new(4);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        let event = MenuEvent::products_changed(CatalogChange::DiscountReset, 6);
        assert_eq!(notifier.notify(event.clone()).unwrap(), 2);

        assert_eq!(a.recv().await.unwrap().event, event);
        assert_eq!(b.recv().await.unwrap().event, event);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips() {
        let notifier = BroadcastNotifier::new(2);
        let mut rx = notifier.subscribe();

        for i in 0..5 {
            notifier.notify(MenuEvent::order_deleted(&i.to_string())).unwrap();
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().event, MenuEvent::order_deleted("3"));
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        notify_best_effort(&Broken, MenuEvent::order_deleted("o"));
    }
}

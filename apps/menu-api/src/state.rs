//! Shared application state handed to every handler.

use std::sync::Arc;

use menu_core::order::{NumberingMode, OrderNumberStrategy};
use menu_db::Database;
use menu_notify::{BroadcastNotifier, HubConfig, Notifier, WsHub};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,

    /// Where services announce committed changes.
    pub notifier: Arc<dyn Notifier>,

    /// The `/ws` endpoint, subscribed to the same broadcast channel.
    pub hub: Arc<WsHub>,

    pub numbering: Arc<dyn OrderNumberStrategy>,
}

impl AppState {
    pub fn new(
        db: Database,
        events: BroadcastNotifier,
        hub_config: HubConfig,
        numbering: NumberingMode,
    ) -> Self {
        let hub = Arc::new(WsHub::new(events.clone(), hub_config));
        AppState {
            db,
            notifier: Arc::new(events),
            hub,
            numbering: Arc::from(numbering.strategy()),
        }
    }

    /// Replaces the notifier services publish through. The hub keeps
    /// listening on its original channel.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

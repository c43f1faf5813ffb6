//! # menu-notify: Event Fan-out
//!
//! Announces committed changes to whoever is listening, and keeps client
//! mirrors from serving stale data for long.
//!
//! ## Module Organization
//!
//! - [`event`] - `MenuEvent` payloads and the `Notification` envelope
//! - [`notifier`] - The `Notifier` trait and the broadcast implementation
//! - [`hub`] - The `/ws` endpoint consoles connect to
//! - [`mirror`] - Bounded-staleness cache invalidated by pushed events
//! - [`error`] - Notification error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! let notifier = BroadcastNotifier::new(256);
//! let hub = Arc::new(WsHub::new(notifier.clone(), HubConfig::default()));
//! let app = Router::new().merge(hub.router());
//!
//! notify_best_effort(&notifier, MenuEvent::order_created(&order));
//! ```

pub mod error;
pub mod event;
pub mod hub;
pub mod mirror;
pub mod notifier;

pub use error::{NotifyError, NotifyResult};
pub use event::{CatalogChange, MenuEvent, Notification};
pub use hub::{HubConfig, WsHub};
pub use mirror::{MirrorCache, MirrorKey};
pub use notifier::{notify_best_effort, BroadcastNotifier, Notifier};

//! # Menu Events
//!
//! What the backend announces after a committed write.
//!
//! ## Wire Format
//! ```json
//! {
//!   "type": "order_created",
//!   "data": { "orderId": "…", "orderNumber": "261016-0042", "itemCount": 3,
//!             "totalCents": 31625, "timestamp": "2026-10-16T12:00:00Z" },
//!   "timestamp": "2026-10-16T12:00:00.120Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use menu_core::{Order, OrderStatus, PaymentStatus, TaxSettings, Voucher};

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
    pub order_number: String,
    pub item_count: usize,
    pub total_cents: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChanged {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRemoved {
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherChanged {
    pub voucher_id: String,
    pub code: String,
    pub used_count: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRemoved {
    pub voucher_id: String,
}

/// Why the catalog changed, and how many products were touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsChanged {
    pub reason: CatalogChange,
    pub affected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogChange {
    Created,
    Updated,
    Deleted,
    Seeded,
    DiscountApplied,
    DiscountReset,
}

// =============================================================================
// Event
// =============================================================================

/// Every event the backend pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MenuEvent {
    OrderCreated(OrderCreated),
    OrderUpdated(OrderChanged),
    OrderDeleted(OrderRemoved),
    VoucherCreated(VoucherChanged),
    VoucherUpdated(VoucherChanged),
    VoucherDeleted(VoucherRemoved),
    VoucherApplied(VoucherChanged),
    ProductsChanged(ProductsChanged),
    TaxSettingsUpdated(TaxSettings),
}

impl MenuEvent {
    pub fn order_created(order: &Order) -> Self {
        MenuEvent::OrderCreated(OrderCreated {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            item_count: order.items.len(),
            total_cents: order.total_cents,
            timestamp: order.created_at,
        })
    }

    pub fn order_updated(order: &Order) -> Self {
        MenuEvent::OrderUpdated(OrderChanged {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            status: order.status,
            payment_status: order.payment_status,
        })
    }

    pub fn order_deleted(order_id: &str) -> Self {
        MenuEvent::OrderDeleted(OrderRemoved {
            order_id: order_id.to_string(),
        })
    }

    pub fn voucher_created(voucher: &Voucher) -> Self {
        MenuEvent::VoucherCreated(VoucherChanged::from(voucher))
    }

    pub fn voucher_updated(voucher: &Voucher) -> Self {
        MenuEvent::VoucherUpdated(VoucherChanged::from(voucher))
    }

    pub fn voucher_applied(voucher: &Voucher) -> Self {
        MenuEvent::VoucherApplied(VoucherChanged::from(voucher))
    }

    pub fn voucher_deleted(voucher_id: &str) -> Self {
        MenuEvent::VoucherDeleted(VoucherRemoved {
            voucher_id: voucher_id.to_string(),
        })
    }

    pub fn products_changed(reason: CatalogChange, affected: u64) -> Self {
        MenuEvent::ProductsChanged(ProductsChanged { reason, affected })
    }

    /// The `type` string this event carries on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            MenuEvent::OrderCreated(_) => "order_created",
            MenuEvent::OrderUpdated(_) => "order_updated",
            MenuEvent::OrderDeleted(_) => "order_deleted",
            MenuEvent::VoucherCreated(_) => "voucher_created",
            MenuEvent::VoucherUpdated(_) => "voucher_updated",
            MenuEvent::VoucherDeleted(_) => "voucher_deleted",
            MenuEvent::VoucherApplied(_) => "voucher_applied",
            MenuEvent::ProductsChanged(_) => "products_changed",
            MenuEvent::TaxSettingsUpdated(_) => "tax_settings_updated",
        }
    }
}

impl From<&Voucher> for VoucherChanged {
    fn from(v: &Voucher) -> Self {
        VoucherChanged {
            voucher_id: v.id.clone(),
            code: v.code.clone(),
            used_count: v.used_count,
            is_active: v.is_active,
        }
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// An event stamped with the time it was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub event: MenuEvent,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(event: MenuEvent) -> Self {
        Notification {
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let n = Notification::new(MenuEvent::order_deleted("o-1"));
        let value = serde_json::to_value(&n).unwrap();

        assert_eq!(value["type"], "order_deleted");
        assert_eq!(value["data"], json!({ "orderId": "o-1" }));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let events = [
            MenuEvent::order_deleted("o"),
            MenuEvent::voucher_deleted("v"),
            MenuEvent::products_changed(CatalogChange::DiscountApplied, 6),
            MenuEvent::TaxSettingsUpdated(TaxSettings::default()),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }

    #[test]
    fn test_envelope_parses_back() {
        let n = Notification::new(MenuEvent::products_changed(CatalogChange::Seeded, 6));
        let parsed: Notification = serde_json::from_str(&n.to_json().unwrap()).unwrap();
        assert_eq!(parsed, n);
    }
}

//! # Domain Types
//!
//! Records shared by every layer: the menu catalog, vouchers, orders and the
//! tax configuration.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Voucher      │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  price_cents    │   │  code (UPPER)   │   │  order_number   │       │
//! │  │  category       │   │  discount       │   │  items (frozen) │       │
//! │  │  original_price │   │  used_count     │   │  breakdown      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Discount      │   │  OrderStatus    │   │  TaxSettings    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Percentage(%)  │   │  Pending        │   │  tax_rate       │       │
//! │  │  Fixed(Money)   │   │  Preparing      │   │  service_rate   │       │
//! │  └─────────────────┘   │  Ready          │   │  *_enabled      │       │
//! │                        │  Delivered ■    │   └─────────────────┘       │
//! │                        │  Canceled  ■    │                              │
//! │                        └─────────────────┘   ■ = terminal               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All wire names are camelCase; amounts are integer cents and rates are
//! basis points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Percent};

/// Table number recorded for take-away orders.
pub const NO_TABLE: &str = "0";

// =============================================================================
// Product Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Pizza,
    Burger,
    Sandwich,
    Drink,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Pizza,
        ProductCategory::Burger,
        ProductCategory::Sandwich,
        ProductCategory::Drink,
        ProductCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Pizza => "pizza",
            ProductCategory::Burger => "burger",
            ProductCategory::Sandwich => "sandwich",
            ProductCategory::Drink => "drink",
            ProductCategory::Other => "other",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ProductCategory::ALL.iter().map(|c| c.to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A dish or drink on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Current selling price in cents. This is the field global discounts rewrite.
    pub price_cents: i64,

    /// Price before the active global discount, if one is applied.
    pub original_price_cents: Option<i64>,

    pub category: ProductCategory,

    /// Image URL or data URI.
    pub image: Option<String>,

    /// Average rating, 0 to 5.
    pub rating: Option<f64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True while a global discount is rewriting this product's price.
    #[inline]
    pub fn is_discounted(&self) -> bool {
        self.original_price_cents.is_some()
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a voucher reduces an order.
///
/// On the wire: `{"type": "percentage", "value": 1000}` (basis points) or
/// `{"type": "fixed", "value": 2500}` (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum Discount {
    Percentage(Percent),
    Fixed(Money),
}

/// Storage discriminant for [`Discount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl Discount {
    pub fn kind(&self) -> DiscountKind {
        match self {
            Discount::Percentage(_) => DiscountKind::Percentage,
            Discount::Fixed(_) => DiscountKind::Fixed,
        }
    }

    /// The stored integer: basis points for percentages, cents for fixed.
    pub fn raw_value(&self) -> i64 {
        match self {
            Discount::Percentage(p) => p.bps() as i64,
            Discount::Fixed(m) => m.cents(),
        }
    }

    /// Rebuilds a discount from its stored parts.
    pub fn from_parts(kind: DiscountKind, raw_value: i64) -> Option<Self> {
        match kind {
            DiscountKind::Percentage => u32::try_from(raw_value)
                .ok()
                .map(|bps| Discount::Percentage(Percent::from_bps(bps))),
            DiscountKind::Fixed => Some(Discount::Fixed(Money::from_cents(raw_value))),
        }
    }
}

// =============================================================================
// Voucher
// =============================================================================

/// A discount code with eligibility rules and an optional usage cap.
///
/// ## Invariants
/// - `code` is stored upper-cased and alphanumeric
/// - `used_count <= max_uses` whenever `max_uses` is set
/// - `code` never changes once `used_count > 0`
/// - a voucher with `used_count > 0` is never deleted, only deactivated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Voucher {
    pub id: String,
    pub code: String,
    pub discount: Discount,
    pub min_order_value_cents: i64,

    /// Category restriction. `None` means the voucher applies to the whole menu.
    pub category: Option<ProductCategory>,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,

    /// Usage cap. `None` means unlimited.
    pub max_uses: Option<i64>,
    pub used_count: i64,
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    #[inline]
    pub fn min_order_value(&self) -> Money {
        Money::from_cents(self.min_order_value_cents)
    }

    /// Uses left before the cap is hit, or `None` when uncapped.
    pub fn remaining_uses(&self) -> Option<i64> {
        self.max_uses.map(|max| (max - self.used_count).max(0))
    }

    #[inline]
    pub fn has_been_used(&self) -> bool {
        self.used_count > 0
    }
}

// =============================================================================
// Tax Settings
// =============================================================================

/// The two flat rates applied to every order.
///
/// Always passed into the pricing functions explicitly; callers read it once
/// per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxSettings {
    #[serde(rename = "taxRateBps")]
    pub tax_rate: Percent,
    pub tax_enabled: bool,
    #[serde(rename = "serviceRateBps")]
    pub service_rate: Percent,
    pub service_enabled: bool,
}

impl Default for TaxSettings {
    /// 15% tax on, 10% service charge off.
    fn default() -> Self {
        TaxSettings {
            tax_rate: Percent::from_whole(15),
            tax_enabled: true,
            service_rate: Percent::from_whole(10),
            service_enabled: false,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Kitchen-facing lifecycle of an order. See [`crate::order`] for transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobilePayment,
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// A rate and the amount it produced, frozen on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxLine {
    #[serde(rename = "rateBps")]
    pub rate: Percent,
    pub amount_cents: i64,
}

impl TaxLine {
    pub fn none() -> Self {
        TaxLine {
            rate: Percent::zero(),
            amount_cents: 0,
        }
    }
}

/// The voucher discount committed on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AppliedDiscount {
    pub voucher_id: String,
    pub voucher_code: String,
    pub discount: Discount,
    pub amount_cents: i64,
}

/// A line on an order. Product data is copied in at assembly time and never
/// read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Catalog reference; the product may since have been edited or deleted.
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub image_snapshot: Option<String>,
    pub quantity: i64,
    pub line_total_cents: i64,
    pub notes: Option<String>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// A placed order. Money fields are computed once at creation and stored.
///
/// ## Invariant
/// `total_cents = subtotal_cents + tax.amount_cents + service_tax.amount_cents
///  − discount.amount_cents` (never below zero)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// `YYMMDD-NNNN`.
    pub order_number: String,
    /// `"0"` when the order is not tied to a table.
    pub table_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub tax: TaxLine,
    pub service_tax: TaxLine,
    pub discount: Option<AppliedDiscount>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub customer: Option<Customer>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn discount_amount(&self) -> Money {
        self.discount
            .as_ref()
            .map(|d| Money::from_cents(d.amount_cents))
            .unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("Pizza".parse::<ProductCategory>().unwrap(), ProductCategory::Pizza);
        assert_eq!(" drink ".parse::<ProductCategory>().unwrap(), ProductCategory::Drink);
        assert!("dessert".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_discount_wire_shape() {
        let pct = serde_json::to_value(Discount::Percentage(Percent::from_whole(10))).unwrap();
        assert_eq!(pct, serde_json::json!({"type": "percentage", "value": 1000}));

        let fixed: Discount =
            serde_json::from_value(serde_json::json!({"type": "fixed", "value": 2500})).unwrap();
        assert_eq!(fixed, Discount::Fixed(Money::from_cents(2500)));
    }

    #[test]
    fn test_discount_parts() {
        let d = Discount::Percentage(Percent::from_bps(1250));
        assert_eq!(Discount::from_parts(d.kind(), d.raw_value()), Some(d));
        assert_eq!(Discount::from_parts(DiscountKind::Percentage, -1), None);
    }

    #[test]
    fn test_tax_settings_default_and_wire_names() {
        let settings = TaxSettings::default();
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(json["taxRateBps"], 1500);
        assert_eq!(json["taxEnabled"], true);
        assert_eq!(json["serviceRateBps"], 1000);
        assert_eq!(json["serviceEnabled"], false);
    }

    #[test]
    fn test_payment_method_wire_name() {
        let json = serde_json::to_value(PaymentMethod::MobilePayment).unwrap();
        assert_eq!(json, "mobile_payment");
    }
}

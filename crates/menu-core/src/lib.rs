//! # menu-core: Pure Ordering Logic
//!
//! Everything that decides *what an order costs* and *whether a voucher may
//! be used* lives here, as deterministic functions over plain values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Menu Ordering Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Menu / Cashier / Admin frontends                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP, /ws push              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 menu-api (axum handlers, services)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ menu-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │ pricing  │ │ voucher  │ │  order   │          │   │
//! │  │   │  Money   │ │Breakdown │ │ validate │ │ assemble │          │   │
//! │  │   │ Percent  │ │ Discount │ │ guards   │ │ numbers  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO GLOBAL SETTINGS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        menu-db (SQLite repositories, atomic voucher claim)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Voucher, Order, TaxSettings)
//! - [`catalog`] - Product drafts/patches, global discount formula, default menu
//! - [`money`] - Integer-cent `Money` and basis-point `Percent`
//! - [`pricing`] - The breakdown pipeline (subtotal → tax → service → discount → total)
//! - [`voucher`] - Voucher eligibility rules and mutation guards
//! - [`order`] - Order assembly, status machine, order-number strategies
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use menu_core::money::{Money, Percent};
//! use menu_core::pricing::{compute_breakdown, PriceLine};
//! use menu_core::types::{Discount, TaxSettings};
//!
//! let lines = [PriceLine::new(Money::from_cents(14_000), 1)];
//! let settings = TaxSettings {
//!     tax_rate: Percent::from_whole(15),
//!     tax_enabled: true,
//!     service_rate: Percent::from_whole(10),
//!     service_enabled: false,
//! };
//! let voucher = Discount::Percentage(Percent::from_whole(10));
//!
//! let breakdown = compute_breakdown(&lines, &settings, Some(&voucher))?;
//! assert_eq!(breakdown.tax.cents(), 2_100);
//! assert_eq!(breakdown.discount.cents(), 1_400);
//! assert_eq!(breakdown.total.cents(), 14_700);
//! # Ok::<(), menu_core::CoreError>(())
//! ```

pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod voucher;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, Percent};
pub use pricing::{compute_breakdown, Breakdown, PriceLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Guards against typing 1000 instead of 10 on the menu keypad.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount accepted, in cents (1,000,000.00).
///
/// Applies to product prices, fixed voucher values and minimum order values.
/// With the cart limits above, a full order stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Largest global menu discount an admin may apply, in whole percent.
pub const MAX_GLOBAL_DISCOUNT_PERCENT: u32 = 90;

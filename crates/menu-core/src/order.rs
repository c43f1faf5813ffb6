//! # Orders
//!
//! Pure half of checkout: turning a cart into an immutable order record,
//! allocating order numbers, and the status machine the cashier drives.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderRequest ──► validate_request (EmptyCart, quantities, notes)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve lines against catalog ──► ProductNotFound                      │
//! │       │       (name / price / image SNAPSHOTTED here)                   │
//! │       ▼                                                                 │
//! │  compute_breakdown(lines, settings, voucher?)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderDraft ──► (storage allocates number) ──► finalize() ──► Order     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Machine
//! ```text
//!   pending ──► preparing ──► ready ──► delivered ■
//!      │            │           │
//!      └────────────┴───────────┴─────► canceled  ■
//! ```
//! Forward moves may skip steps. Terminal states (■) accept nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{compute_breakdown, Breakdown, PriceLine};
use crate::types::{
    AppliedDiscount, Customer, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    Product, TaxLine, TaxSettings, Voucher,
};
use crate::validation::{
    normalize_table_number, validate_cart_size, validate_notes, validate_quantity,
};
use crate::voucher::ensure_usable;

// =============================================================================
// Status Machine
// =============================================================================

impl OrderStatus {
    /// Delivered and canceled orders are closed.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Ready => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Canceled => 4,
        }
    }

    /// Whether the cashier may move an order from `self` to `next`.
    ///
    /// Staying in the same state is always allowed (a no-op update).
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == OrderStatus::Canceled || next.rank() > self.rank()
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" | "cancelled" => Ok(OrderStatus::Canceled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "preparing", "ready", "delivered", "canceled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidStatusTransition { from, to })
    }
}

// =============================================================================
// Order Numbers
// =============================================================================

/// Allocates the next `YYMMDD-NNNN` order number.
///
/// Implementations are pure; the storage layer supplies the most recently
/// created order number and serializes calls.
pub trait OrderNumberStrategy: Send + Sync + fmt::Debug {
    fn next_number(&self, last: Option<&str>, today: NaiveDate) -> String;
}

/// Counter continues from the last order regardless of its date.
///
/// `250101-0042` followed by an order on 2 January gives `250102-0043`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSequence;

/// Counter restarts at 1 whenever the date prefix changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySequence;

impl OrderNumberStrategy for GlobalSequence {
    fn next_number(&self, last: Option<&str>, today: NaiveDate) -> String {
        let counter = last
            .and_then(split_order_number)
            .map(|(_, n)| n + 1)
            .unwrap_or(1);
        format_order_number(today, counter)
    }
}

impl OrderNumberStrategy for DailySequence {
    fn next_number(&self, last: Option<&str>, today: NaiveDate) -> String {
        let prefix = date_prefix(today);
        let counter = last
            .and_then(split_order_number)
            .filter(|(p, _)| *p == prefix)
            .map(|(_, n)| n + 1)
            .unwrap_or(1);
        format_order_number(today, counter)
    }
}

/// Which [`OrderNumberStrategy`] the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingMode {
    #[default]
    Global,
    Daily,
}

impl NumberingMode {
    pub fn strategy(&self) -> Box<dyn OrderNumberStrategy> {
        match self {
            NumberingMode::Global => Box::new(GlobalSequence),
            NumberingMode::Daily => Box::new(DailySequence),
        }
    }
}

impl FromStr for NumberingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(NumberingMode::Global),
            "daily" => Ok(NumberingMode::Daily),
            _ => Err(ValidationError::NotAllowed {
                field: "numbering".to_string(),
                allowed: vec!["global".to_string(), "daily".to_string()],
            }),
        }
    }
}

fn date_prefix(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

fn format_order_number(date: NaiveDate, counter: u64) -> String {
    format!("{}-{:04}", date_prefix(date), counter)
}

fn split_order_number(number: &str) -> Option<(&str, u64)> {
    let (prefix, counter) = number.split_once('-')?;
    Some((prefix, counter.parse().ok()?))
}

// =============================================================================
// Requests
// =============================================================================

/// One cart line as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Checkout payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

/// Checks the shape of a cart before any product is looked up.
pub fn validate_lines(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut errors = Vec::new();
    if let Err(e) = validate_cart_size(lines.len()) {
        errors.push(e);
    }

    for (i, line) in lines.iter().enumerate() {
        if line.product_id.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: format!("items[{i}].productId"),
            });
        }
        if let Err(e) = validate_quantity(line.quantity) {
            errors.push(rename_field(e, format!("items[{i}].quantity")));
        }
        if let Some(notes) = &line.notes {
            if let Err(e) = validate_notes(notes) {
                errors.push(rename_field(e, format!("items[{i}].notes")));
            }
        }
    }

    CoreError::from_field_errors(errors)
}

fn rename_field(err: ValidationError, name: String) -> ValidationError {
    match err {
        ValidationError::Required { .. } => ValidationError::Required { field: name },
        ValidationError::TooShort { min, .. } => ValidationError::TooShort { field: name, min },
        ValidationError::TooLong { max, .. } => ValidationError::TooLong { field: name, max },
        ValidationError::OutOfRange { min, max, .. } => ValidationError::OutOfRange {
            field: name,
            min,
            max,
        },
        ValidationError::MustBePositive { .. } => ValidationError::MustBePositive { field: name },
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: name,
            reason,
        },
        ValidationError::NotAllowed { allowed, .. } => ValidationError::NotAllowed {
            field: name,
            allowed,
        },
    }
}

/// Pairs each cart line with its live product.
fn resolve<'a>(
    lines: &'a [CartLine],
    catalog: &'a [Product],
) -> CoreResult<Vec<(&'a CartLine, &'a Product)>> {
    lines
        .iter()
        .map(|line| {
            catalog
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|p| (line, p))
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))
        })
        .collect()
}

/// Server-computed breakdown for a cart, without persisting anything.
///
/// When a voucher is given it is re-validated against the cart subtotal.
pub fn quote(
    lines: &[CartLine],
    catalog: &[Product],
    settings: &TaxSettings,
    voucher: Option<&Voucher>,
    now: DateTime<Utc>,
) -> CoreResult<Breakdown> {
    validate_lines(lines)?;
    let resolved = resolve(lines, catalog)?;
    let priced: Vec<PriceLine> = resolved
        .iter()
        .map(|(line, p)| PriceLine::new(p.price(), line.quantity))
        .collect();

    let discount = match voucher {
        Some(v) => {
            ensure_usable(v, crate::pricing::subtotal(&priced)?, now)?;
            Some(v.discount)
        }
        None => None,
    };

    compute_breakdown(&priced, settings, discount.as_ref())
}

// =============================================================================
// Assembly
// =============================================================================

/// A fully priced order that has not yet been given a number.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub id: String,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    pub breakdown: Breakdown,
    pub tax: TaxLine,
    pub service_tax: TaxLine,
    pub discount: Option<AppliedDiscount>,
    pub payment_method: PaymentMethod,
    pub customer: Option<Customer>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Builds an order from a checkout request.
    ///
    /// Product name, price and image are copied into each item here and never
    /// read from the catalog again. `settings` is the tax configuration read
    /// once for this request.
    pub fn assemble(
        request: &OrderRequest,
        catalog: &[Product],
        settings: &TaxSettings,
        voucher: Option<&Voucher>,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderDraft> {
        validate_lines(&request.items)?;

        let mut errors = Vec::new();
        let table_number = normalize_table_number(request.table_number.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        if let Some(notes) = &request.notes {
            if let Err(e) = validate_notes(notes) {
                errors.push(e);
            }
        }
        CoreError::from_field_errors(errors)?;

        let resolved = resolve(&request.items, catalog)?;
        let order_id = Uuid::new_v4().to_string();

        let items: Vec<OrderItem> = resolved
            .iter()
            .map(|(line, product)| -> CoreResult<OrderItem> {
                Ok(OrderItem {
                    id: Uuid::new_v4().to_string(),
                    order_id: order_id.clone(),
                    product_id: product.id.clone(),
                    name_snapshot: product.name.clone(),
                    unit_price_cents: product.price_cents,
                    image_snapshot: product.image.clone(),
                    quantity: line.quantity,
                    line_total_cents: PriceLine::new(product.price(), line.quantity)
                        .total()?
                        .cents(),
                    notes: line.notes.clone().filter(|n| !n.trim().is_empty()),
                })
            })
            .collect::<CoreResult<_>>()?;

        let priced: Vec<PriceLine> = items
            .iter()
            .map(|i| PriceLine::new(i.unit_price(), i.quantity))
            .collect();

        if let Some(v) = voucher {
            ensure_usable(v, crate::pricing::subtotal(&priced)?, now)?;
        }

        let breakdown = compute_breakdown(&priced, settings, voucher.map(|v| &v.discount))?;

        let discount = voucher.map(|v| AppliedDiscount {
            voucher_id: v.id.clone(),
            voucher_code: v.code.clone(),
            discount: v.discount,
            amount_cents: breakdown.discount.cents(),
        });

        Ok(OrderDraft {
            id: order_id,
            table_number: table_number.unwrap_or_default(),
            items,
            breakdown,
            tax: TaxLine {
                rate: if settings.tax_enabled {
                    settings.tax_rate
                } else {
                    Default::default()
                },
                amount_cents: breakdown.tax.cents(),
            },
            service_tax: TaxLine {
                rate: if settings.service_enabled {
                    settings.service_rate
                } else {
                    Default::default()
                },
                amount_cents: breakdown.service_tax.cents(),
            },
            discount,
            payment_method: request.payment_method.unwrap_or_default(),
            customer: request.customer.clone(),
            notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
            created_at: now,
        })
    }

    /// Subtotal the voucher claim must re-check against.
    pub fn subtotal(&self) -> Money {
        self.breakdown.subtotal
    }

    /// Stamps the allocated number and produces the order record.
    pub fn finalize(self, order_number: String) -> Order {
        Order {
            id: self.id,
            order_number,
            table_number: self.table_number,
            items: self.items,
            subtotal_cents: self.breakdown.subtotal.cents(),
            tax: self.tax,
            service_tax: self.service_tax,
            discount: self.discount,
            total_cents: self.breakdown.total.cents(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: self.payment_method,
            customer: self.customer,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.created_at,
            completed_at: None,
            cancelled_at: None,
        }
    }
}

// =============================================================================
// Updates
// =============================================================================

/// Cashier-side order update. Money fields are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

impl OrderUpdate {
    /// Applies the update through the status machine.
    ///
    /// Entering `delivered` stamps `completed_at`; entering `canceled` stamps
    /// `cancelled_at`.
    pub fn apply_to(self, current: &Order, now: DateTime<Utc>) -> CoreResult<Order> {
        let mut next = current.clone();

        if let Some(status) = self.status {
            check_transition(current.status, status)?;
            if status != current.status {
                match status {
                    OrderStatus::Delivered => next.completed_at = Some(now),
                    OrderStatus::Canceled => next.cancelled_at = Some(now),
                    _ => {}
                }
                next.status = status;
            }
        }

        if let Some(payment) = self.payment_status {
            next.payment_status = payment;
        }

        if let Some(notes) = self.notes {
            validate_notes(&notes)?;
            next.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }

        next.updated_at = now;
        Ok(next)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Percent;
    use crate::types::{Discount, ProductCategory};
    use chrono::Duration;

    fn product(id: &str, name: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price_cents,
            original_price_cents: None,
            category: ProductCategory::Pizza,
            image: Some(format!("/img/{id}.png")),
            rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p1", "Margherita", 14_000),
            product("p2", "Cola", 3_500),
        ]
    }

    fn line(id: &str, qty: i64) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            quantity: qty,
            notes: None,
        }
    }

    fn request(items: Vec<CartLine>) -> OrderRequest {
        OrderRequest {
            items,
            ..Default::default()
        }
    }

    fn voucher(now: DateTime<Utc>) -> Voucher {
        Voucher {
            id: "v1".to_string(),
            code: "SAVE10".to_string(),
            discount: Discount::Percentage(Percent::from_whole(10)),
            min_order_value_cents: 0,
            category: None,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(1),
            max_uses: Some(5),
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Preparing));
        assert!(Pending.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Delivered));
        assert!(Preparing.can_transition_to(Canceled));
        assert!(Ready.can_transition_to(Ready));

        assert!(!Ready.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Ready));
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        assert_eq!(
            "cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Canceled
        );
        assert!("cooking".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_global_sequence_ignores_date() {
        let s = GlobalSequence;
        assert_eq!(s.next_number(None, date(2025, 1, 1)), "250101-0001");
        assert_eq!(
            s.next_number(Some("250101-0042"), date(2025, 1, 2)),
            "250102-0043"
        );
        assert_eq!(
            s.next_number(Some("241231-9999"), date(2025, 1, 1)),
            "250101-10000"
        );
        // Unparsable history starts over
        assert_eq!(s.next_number(Some("legacy"), date(2025, 1, 1)), "250101-0001");
    }

    #[test]
    fn test_daily_sequence_resets() {
        let s = DailySequence;
        assert_eq!(
            s.next_number(Some("250101-0042"), date(2025, 1, 1)),
            "250101-0043"
        );
        assert_eq!(
            s.next_number(Some("250101-0042"), date(2025, 1, 2)),
            "250102-0001"
        );
    }

    #[test]
    fn test_numbering_mode() {
        assert_eq!("Daily".parse::<NumberingMode>().unwrap(), NumberingMode::Daily);
        assert!("weekly".parse::<NumberingMode>().is_err());
        let strategy = NumberingMode::default().strategy();
        assert_eq!(
            strategy.next_number(Some("250101-0007"), date(2025, 3, 4)),
            "250304-0008"
        );
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = OrderDraft::assemble(
            &request(vec![]),
            &catalog(),
            &TaxSettings::default(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_unknown_product_rejected() {
        let err = OrderDraft::assemble(
            &request(vec![line("p1", 1), line("ghost", 1)]),
            &catalog(),
            &TaxSettings::default(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_oversized_stored_price_fails_instead_of_wrapping() {
        // A row written before prices were capped
        let products = vec![product("p1", "Legacy", i64::MAX / 2)];
        let lines = vec![line("p1", 3)];

        let err = OrderDraft::assemble(
            &request(lines.clone()),
            &products,
            &TaxSettings::default(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow));

        let err = quote(&lines, &products, &TaxSettings::default(), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow));
    }

    #[test]
    fn test_line_errors_are_per_field() {
        let err = validate_lines(&[line("p1", 0), line("", 1000)]).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field()).collect();
        assert_eq!(
            fields,
            vec!["items[0].quantity", "items[1].productId", "items[1].quantity"]
        );
    }

    #[test]
    fn test_assemble_snapshots_and_prices() {
        let now = Utc::now();
        let mut products = catalog();
        let draft = OrderDraft::assemble(
            &request(vec![line("p1", 1), line("p2", 2)]),
            &products,
            &TaxSettings::default(),
            None,
            now,
        )
        .unwrap();

        // Later catalog edits do not reach the draft
        products[0].name = "Renamed".to_string();
        products[0].price_cents = 1;

        assert_eq!(draft.items[0].name_snapshot, "Margherita");
        assert_eq!(draft.items[0].unit_price_cents, 14_000);
        assert_eq!(draft.items[1].line_total_cents, 7_000);
        assert_eq!(draft.items[0].image_snapshot.as_deref(), Some("/img/p1.png"));
        assert!(draft.items.iter().all(|i| i.order_id == draft.id));

        assert_eq!(draft.breakdown.subtotal.cents(), 21_000);
        assert_eq!(draft.tax.rate, Percent::from_whole(15));
        assert_eq!(draft.tax.amount_cents, 3_150);
        assert_eq!(draft.service_tax, TaxLine::none());
        assert_eq!(draft.table_number, "0");
    }

    #[test]
    fn test_assemble_with_voucher() {
        let now = Utc::now();
        let v = voucher(now);
        let draft = OrderDraft::assemble(
            &request(vec![line("p1", 1)]),
            &catalog(),
            &TaxSettings::default(),
            Some(&v),
            now,
        )
        .unwrap();

        let applied = draft.discount.clone().unwrap();
        assert_eq!(applied.voucher_code, "SAVE10");
        assert_eq!(applied.amount_cents, 1_400);

        let order = draft.finalize("250101-0001".to_string());
        assert_eq!(order.total_cents, 14_700);
        assert_eq!(
            order.total_cents,
            order.subtotal_cents + order.tax.amount_cents + order.service_tax.amount_cents
                - order.discount_amount().cents()
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_assemble_rejects_ineligible_voucher() {
        let now = Utc::now();
        let v = Voucher {
            min_order_value_cents: 20_000,
            ..voucher(now)
        };
        let err = OrderDraft::assemble(
            &request(vec![line("p2", 1)]),
            &catalog(),
            &TaxSettings::default(),
            Some(&v),
            now,
        )
        .unwrap_err();
        assert_eq!(err.reason_code(), Some("min_order_not_met"));
    }

    #[test]
    fn test_quote_matches_assembly() {
        let now = Utc::now();
        let v = voucher(now);
        let items = vec![line("p1", 2), line("p2", 3)];
        let settings = TaxSettings {
            service_enabled: true,
            ..TaxSettings::default()
        };

        let quoted = quote(&items, &catalog(), &settings, Some(&v), now).unwrap();
        let draft =
            OrderDraft::assemble(&request(items), &catalog(), &settings, Some(&v), now).unwrap();
        assert_eq!(quoted, draft.breakdown);
    }

    #[test]
    fn test_update_stamps_terminal_times() {
        let now = Utc::now();
        let order = OrderDraft::assemble(
            &request(vec![line("p1", 1)]),
            &catalog(),
            &TaxSettings::default(),
            None,
            now,
        )
        .unwrap()
        .finalize("250101-0001".to_string());

        let later = now + Duration::minutes(20);
        let delivered = OrderUpdate {
            status: Some(OrderStatus::Delivered),
            payment_status: Some(PaymentStatus::Paid),
            notes: None,
        }
        .apply_to(&order, later)
        .unwrap();
        assert_eq!(delivered.completed_at, Some(later));
        assert_eq!(delivered.cancelled_at, None);
        assert_eq!(delivered.payment_status, PaymentStatus::Paid);
        assert_eq!(delivered.total_cents, order.total_cents);

        let err = OrderUpdate {
            status: Some(OrderStatus::Canceled),
            ..Default::default()
        }
        .apply_to(&delivered, later)
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_same_status_update_is_noop() {
        let now = Utc::now();
        let order = OrderDraft::assemble(
            &request(vec![line("p1", 1)]),
            &catalog(),
            &TaxSettings::default(),
            None,
            now,
        )
        .unwrap()
        .finalize("250101-0001".to_string());

        let canceled = OrderUpdate {
            status: Some(OrderStatus::Canceled),
            ..Default::default()
        }
        .apply_to(&order, now)
        .unwrap();
        let again = OrderUpdate {
            status: Some(OrderStatus::Canceled),
            ..Default::default()
        }
        .apply_to(&canceled, now + Duration::minutes(1))
        .unwrap();
        assert_eq!(again.cancelled_at, canceled.cancelled_at);
    }
}

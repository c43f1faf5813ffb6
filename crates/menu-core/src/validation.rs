//! # Validation Module
//!
//! Input validation for menu, voucher and order requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (menu / cashier / admin)                            │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules, collected per request                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (voucher code, order number)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use menu_core::validation::{normalize_voucher_code, validate_quantity};
//!
//! assert_eq!(normalize_voucher_code(" save10 ").unwrap(), "SAVE10");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Percent;
use crate::{MAX_CART_ITEMS, MAX_GLOBAL_DISCOUNT_PERCENT, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const VOUCHER_CODE_MIN_LEN: usize = 3;
pub const VOUCHER_CODE_MAX_LEN: usize = 32;
const NAME_MAX_LEN: usize = 200;
const DESCRIPTION_MAX_LEN: usize = 1000;
const NOTES_MAX_LEN: usize = 500;
const TABLE_NUMBER_MAX_LEN: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and canonicalizes a voucher code.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Letters and digits only
/// - 3 to 32 characters
///
/// ## Returns
/// The upper-cased code, which is the form stored and looked up.
///
/// ```rust
/// use menu_core::validation::normalize_voucher_code;
///
/// assert_eq!(normalize_voucher_code("summer24").unwrap(), "SUMMER24");
/// assert!(normalize_voucher_code("SAVE-10").is_err());
/// assert!(normalize_voucher_code("AB").is_err());
/// ```
pub fn normalize_voucher_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    if code.len() < VOUCHER_CODE_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: VOUCHER_CODE_MIN_LEN,
        });
    }

    if code.len() > VOUCHER_CODE_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: VOUCHER_CODE_MAX_LEN,
        });
    }

    Ok(code.to_ascii_uppercase())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: NAME_MAX_LEN,
        });
    }

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    max_len("description", description, DESCRIPTION_MAX_LEN)
}

pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    max_len("notes", notes, NOTES_MAX_LEN)
}

/// Normalizes a table number. Blank means no table (`"0"`).
pub fn normalize_table_number(table: Option<&str>) -> ValidationResult<String> {
    let table = table.map(str::trim).unwrap_or_default();
    if table.is_empty() {
        return Ok(crate::types::NO_TABLE.to_string());
    }
    max_len("tableNumber", table, TABLE_NUMBER_MAX_LEN)?;
    Ok(table.to_string())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - At most [`MAX_PRICE_CENTS`]
///
/// ```rust
/// use menu_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(14_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX / 2).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_amount_cents("price", cents)
}

/// Validates a non-negative money amount against [`MAX_PRICE_CENTS`].
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Ratings are 0 to 5 inclusive.
pub fn validate_rating(rating: f64) -> ValidationResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 0,
            max: 5,
        });
    }
    Ok(())
}

/// Validates a tax or service rate.
///
/// ## Rules
/// - 0% to 100% (0 to 10000 bps)
pub fn validate_rate(field: &str, rate: Percent) -> ValidationResult<()> {
    if rate > Percent::FULL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a global menu discount: above 0% and at most 90%.
pub fn validate_global_discount(pct: Percent) -> ValidationResult<()> {
    if pct.is_zero() || pct > Percent::from_whole(MAX_GLOBAL_DISCOUNT_PERCENT) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 1,
            max: MAX_GLOBAL_DISCOUNT_PERCENT as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in an order.
///
/// ## Rules
/// - At most MAX_CART_ITEMS (100) lines
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use menu_core::validation::validate_uuid;
///
/// assert!(validate_uuid("voucherId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("voucherId", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_voucher_code() {
        assert_eq!(normalize_voucher_code("save10").unwrap(), "SAVE10");
        assert_eq!(normalize_voucher_code("  Pizza2024 ").unwrap(), "PIZZA2024");

        assert!(matches!(
            normalize_voucher_code(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(normalize_voucher_code("has space").is_err());
        assert!(normalize_voucher_code("SAVE_10").is_err());
        assert!(normalize_voucher_code("AB").is_err());
        assert!(normalize_voucher_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Margherita").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(-1).is_err());

        for huge in [MAX_PRICE_CENTS + 1, i64::MAX / 2, i64::MAX] {
            assert_eq!(
                validate_price_cents(huge),
                Err(ValidationError::OutOfRange {
                    field: "price".to_string(),
                    min: 0,
                    max: MAX_PRICE_CENTS,
                })
            );
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(4.5).is_ok());
        assert!(validate_rating(5.1).is_err());
        assert!(validate_rating(-0.1).is_err());
    }

    #[test]
    fn test_normalize_table_number() {
        assert_eq!(normalize_table_number(None).unwrap(), "0");
        assert_eq!(normalize_table_number(Some("  ")).unwrap(), "0");
        assert_eq!(normalize_table_number(Some(" 12 ")).unwrap(), "12");
        assert!(normalize_table_number(Some("12345678901")).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_rate("taxRate", Percent::zero()).is_ok());
        assert!(validate_rate("taxRate", Percent::FULL).is_ok());
        assert!(validate_rate("taxRate", Percent::from_bps(10_001)).is_err());

        assert!(validate_global_discount(Percent::from_whole(20)).is_ok());
        assert!(validate_global_discount(Percent::from_whole(90)).is_ok());
        assert!(validate_global_discount(Percent::zero()).is_err());
        assert!(validate_global_discount(Percent::from_whole(91)).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}

//! # Error Types
//!
//! Domain-specific error types for menu-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  menu-core errors (this file)                                          │
//! │  ├── CoreError        - Domain errors, each with an ErrorKind          │
//! │  └── ValidationError  - Input validation failures (per field)          │
//! │                                                                         │
//! │  menu-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, unique/condition violations  │
//! │                                                                         │
//! │  menu-api errors (in app)                                              │
//! │  └── ApiError         - JSON envelope + HTTP status                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Client                 │
//! │                          DbError ──┘                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each variant belongs to exactly one [`ErrorKind`]; the HTTP layer maps
//!    kinds to status codes and never inspects messages

use thiserror::Error;

use crate::types::OrderStatus;
use crate::voucher::VoucherRejection;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification used by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input. Always caller-fixable.
    Validation,
    /// Referenced product, voucher or order does not exist.
    NotFound,
    /// Uniqueness clash or a concurrent change won the race.
    Conflict,
    /// Input is well-formed but a business rule forbids the operation.
    BusinessRule,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with no line items.
    #[error("Order must contain at least one item")]
    EmptyCart,

    /// A cart line references a product that is not on the menu.
    ///
    /// ## When This Occurs
    /// - The product was deleted after the customer loaded the menu
    /// - A stale browser tab still holds an old cart
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Voucher code or id does not exist (or, for code lookups, is inactive).
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Voucher exists but cannot be used for this order right now.
    ///
    /// ## User Workflow
    /// ```text
    /// Enter code "SAVE10"
    ///      │
    ///      ▼
    /// validate(voucher, 80.00, now)
    ///      │
    ///      ▼
    /// VoucherRejected { code: "SAVE10", reason: MinOrderNotMet }
    ///      │
    ///      ▼
    /// UI shows: "Minimum order value not met"
    /// ```
    #[error("Voucher {code} cannot be used: {reason}")]
    VoucherRejected {
        code: String,
        reason: VoucherRejection,
    },

    /// The code of a voucher that has been used is frozen.
    #[error("Voucher {code} has been used {used_count} time(s); its code cannot change")]
    VoucherCodeLocked { code: String, used_count: i64 },

    /// A used voucher can only be deactivated, never deleted.
    #[error("Voucher {code} has been used {used_count} time(s); deactivate it instead")]
    VoucherInUse { code: String, used_count: i64 },

    /// Line totals or the order total do not fit in an `i64` of cents.
    ///
    /// Prices are capped when saved, so this only fires for rows written
    /// before the cap or carts built outside the API.
    #[error("Order total is too large")]
    AmountOverflow,

    /// Order status change not allowed by the status machine.
    #[error("Order cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Several fields failed validation at once.
    #[error("Validation failed for {} field(s)", .0.len())]
    InvalidFields(Vec<ValidationError>),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EmptyCart
            | CoreError::AmountOverflow
            | CoreError::Validation(_)
            | CoreError::InvalidFields(_) => ErrorKind::Validation,
            CoreError::ProductNotFound(_)
            | CoreError::VoucherNotFound(_)
            | CoreError::OrderNotFound(_) => ErrorKind::NotFound,
            CoreError::VoucherRejected { .. }
            | CoreError::VoucherCodeLocked { .. }
            | CoreError::VoucherInUse { .. }
            | CoreError::InvalidStatusTransition { .. } => ErrorKind::BusinessRule,
        }
    }

    /// Machine-readable reason for business rule violations.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            CoreError::VoucherRejected { reason, .. } => Some(reason.code()),
            CoreError::VoucherCodeLocked { .. } => Some("code_locked"),
            CoreError::VoucherInUse { .. } => Some("voucher_in_use"),
            CoreError::InvalidStatusTransition { .. } => Some("invalid_status_transition"),
            _ => None,
        }
    }

    /// Every field-level error carried by this error.
    pub fn field_errors(&self) -> Vec<&ValidationError> {
        match self {
            CoreError::Validation(err) => vec![err],
            CoreError::InvalidFields(errs) => errs.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Collapses a list of failures into one error, or `Ok` when empty.
    pub fn from_field_errors(mut errors: Vec<ValidationError>) -> CoreResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(CoreError::Validation(errors.remove(0))),
            _ => Err(CoreError::InvalidFields(errors)),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field, as reported to clients.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

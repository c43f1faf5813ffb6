//! # Repository Module
//!
//! Database repository implementations for the menu backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler / service                                                 │
//! │       │                                                                 │
//! │       │  db.vouchers().claim(&id, subtotal, now)                        │
//! │       ▼                                                                 │
//! │  VoucherRepository                                                      │
//! │  ├── list / get_by_id / find_active_by_code                             │
//! │  ├── insert / update (guarded) / delete (unused only)                   │
//! │  └── claim (conditional increment)                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Repositories never decide business outcomes. They store what          │
//! │  menu-core produced and report when a guarded write matched nothing.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, global discount, seeding
//! - [`VoucherRepository`](voucher::VoucherRepository) - Voucher CRUD and the atomic claim
//! - [`OrderRepository`](order::OrderRepository) - Numbered, transactional order creation
//! - [`SettingsRepository`](settings::SettingsRepository) - Tax settings row

pub mod order;
pub mod product;
pub mod settings;
pub mod voucher;

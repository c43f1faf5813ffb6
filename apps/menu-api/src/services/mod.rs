//! Service layer.
//!
//! Each service reads what it needs, runs the menu-core rules, writes
//! through menu-db and, once the write has committed, announces it.

pub mod catalog_service;
pub mod order_service;
pub mod settings_service;
pub mod voucher_service;

pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use settings_service::SettingsService;
pub use voucher_service::VoucherService;

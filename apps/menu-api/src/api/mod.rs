//! HTTP routes.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | /health | [`health`] |
//! | GET, POST | /api/products | [`products`] |
//! | GET, PUT, DELETE | /api/products/{id} | [`products`] |
//! | POST | /api/products/defaults | [`products`] |
//! | POST, DELETE | /api/products/discount | [`products`] |
//! | GET, POST | /api/vouchers | [`vouchers`] |
//! | GET, PUT, DELETE | /api/vouchers/{id} | [`vouchers`] |
//! | POST | /api/vouchers/validate | [`vouchers`] |
//! | POST | /api/vouchers/apply | [`vouchers`] |
//! | GET, POST | /api/orders | [`orders`] |
//! | POST | /api/orders/quote | [`orders`] |
//! | GET, PUT, DELETE | /api/orders/{id} | [`orders`] |
//! | GET, PUT | /api/settings/tax | [`settings`] |
//!
//! `/ws` is served by the menu-notify hub and merged in by [`crate::build_app`].

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod orders;
pub mod products;
pub mod settings;
pub mod vouchers;


pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(vouchers::router())
        .merge(orders::router())
        .merge(settings::router())
}

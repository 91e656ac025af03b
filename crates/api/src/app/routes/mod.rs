use axum::Router;

pub mod stock;
pub mod system;

/// Router for every ledger endpoint.
pub fn router() -> Router {
    Router::new().nest("/stock", stock::router())
}

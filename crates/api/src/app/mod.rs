//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: engine, store, catalog and signal bus wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and the response envelope
//! - `errors.rs`: ledger errors mapped to status codes and JSON bodies

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockledger_infra::LedgerConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &LedgerConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router_with(services))
}

/// Router over already-built services (tests keep a handle to the engine).
pub fn router_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

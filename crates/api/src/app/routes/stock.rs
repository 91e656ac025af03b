use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use stockledger_core::{LedgerError, LedgerResult, ProductId, SellerId};
use stockledger_infra::ProductContext;

use crate::app::dto::{self, ApiResponse, StockView};
use crate::app::errors;
use crate::app::services::{AppServices, LedgerEngine};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_stock))
        .route("/check-availability", post(check_availability))
        .route("/low-stock", get(list_low_stock))
        .route("/product/:id", get(get_stock))
        .route("/product/:id/reserve", put(reserve))
        .route("/product/:id/confirm", put(confirm_sale))
        .route("/product/:id/release", put(release))
        .route("/product/:id/add", put(add_stock))
}

/// Run an engine call off the async runtime; mutations may wait on a product lock.
async fn blocking<T, F>(services: &AppServices, f: F) -> Result<T, axum::response::Response>
where
    T: Send + 'static,
    F: FnOnce(&LedgerEngine) -> LedgerResult<T> + Send + 'static,
{
    let engine = services.engine_handle();
    match tokio::task::spawn_blocking(move || f(&engine)).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(errors::ledger_error_to_response(e)),
        Err(e) => Err(errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            e.to_string(),
        )),
    }
}

fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(errors::ledger_error_to_response)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| errors::ledger_error_to_response(LedgerError::validation(e.body_text())))
}

fn ok(status: StatusCode, message: &str, record: impl Into<StockView>) -> axum::response::Response {
    (status, Json(ApiResponse::ok(message, record.into()))).into_response()
}

pub async fn create_stock(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let req = match body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product_id = ProductId::new(req.product_id);
    let context = (req.product_name.is_some() || req.seller_id.is_some()).then(|| ProductContext {
        name: req.product_name.unwrap_or_default(),
        seller_id: req.seller_id.map(SellerId::new),
    });
    let catalog = services.catalog_handle();

    // Context is registered under the new record's lock, before any mutator can
    // cross the threshold and emit a signal for it.
    let created = match blocking(&services, move |engine| {
        engine.create_stock_with(product_id, req.quantity, req.low_stock_threshold, |_| {
            if let Some(context) = context {
                catalog.upsert(product_id, context);
            }
        })
    })
    .await
    {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    ok(StatusCode::CREATED, "stock created", created)
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.engine().get_stock(product_id) {
        Ok(r) => ok(StatusCode::OK, "stock retrieved", r),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn check_availability(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CheckAvailabilityRequest>, JsonRejection>,
) -> axum::response::Response {
    let req = match body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .engine()
        .check_availability(ProductId::new(req.product_id), req.quantity)
    {
        Ok(a) => {
            let message = a.message.clone();
            (StatusCode::OK, Json(ApiResponse::ok(message, a))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_low_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.engine().list_low_stock() {
        Ok(records) => {
            let views: Vec<StockView> = records.iter().map(StockView::from).collect();
            let message = format!("{} product(s) at or below threshold", views.len());
            (StatusCode::OK, Json(ApiResponse::ok(message, views))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

async fn mutate(
    services: Arc<AppServices>,
    id: String,
    payload: Result<Json<dto::QuantityRequest>, JsonRejection>,
    message: &'static str,
    op: fn(&LedgerEngine, ProductId, u64) -> LedgerResult<stockledger_inventory::StockRecord>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let req = match body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(&services, move |engine| op(engine, product_id, req.quantity)).await {
        Ok(r) => ok(StatusCode::OK, message, r),
        Err(resp) => resp,
    }
}

pub async fn reserve(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    mutate(services, id, payload, "stock reserved", LedgerEngine::reserve).await
}

pub async fn confirm_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    mutate(services, id, payload, "sale confirmed", LedgerEngine::confirm_sale).await
}

pub async fn release(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    mutate(services, id, payload, "reservation released", LedgerEngine::release).await
}

pub async fn add_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    mutate(services, id, payload, "stock added", LedgerEngine::add_stock).await
}

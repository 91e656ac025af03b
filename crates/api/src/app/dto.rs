use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::ProductId;
use stockledger_inventory::StockRecord;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateStockRequest {
    pub product_id: u64,
    pub quantity: u64,
    pub low_stock_threshold: Option<u64>,
    /// Catalog context carried into low-stock signals.
    pub product_name: Option<String>,
    pub seller_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u64,
}

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityRequest {
    pub product_id: u64,
    pub quantity: u64,
}

// -------------------------
// Response DTOs
// -------------------------

/// Uniform success body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockView {
    pub product_id: ProductId,
    pub available_quantity: u64,
    pub reserved_quantity: u64,
    pub total_quantity: u64,
    pub low_stock_threshold: u64,
    pub is_low_stock: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StockRecord> for StockView {
    fn from(r: &StockRecord) -> Self {
        Self {
            product_id: r.product_id(),
            available_quantity: r.available_quantity(),
            reserved_quantity: r.reserved_quantity(),
            total_quantity: r.total_quantity(),
            low_stock_threshold: r.low_stock_threshold(),
            is_low_stock: r.is_low_stock(),
            version: r.version(),
            created_at: r.created_at(),
            updated_at: r.updated_at(),
        }
    }
}

impl From<StockRecord> for StockView {
    fn from(r: StockRecord) -> Self {
        Self::from(&r)
    }
}

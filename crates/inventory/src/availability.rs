use serde::Serialize;

use stockledger_core::ProductId;

use crate::stock::StockRecord;

/// Answer to "can `requested_quantity` units be reserved right now?".
///
/// A point-in-time read; a later `reserve` may still fail if other callers get
/// there first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub product_id: ProductId,
    pub available: bool,
    pub available_quantity: u64,
    pub reserved_quantity: u64,
    pub total_quantity: u64,
    pub requested_quantity: u64,
    pub message: String,
}

impl Availability {
    pub fn of(record: &StockRecord, requested_quantity: u64) -> Self {
        let available = record.is_available(requested_quantity);
        let message = if available {
            "stock available".to_string()
        } else {
            format!(
                "insufficient stock: available {}, requested {}",
                record.available_quantity(),
                requested_quantity
            )
        };

        Self {
            product_id: record.product_id(),
            available,
            available_quantity: record.available_quantity(),
            reserved_quantity: record.reserved_quantity(),
            total_quantity: record.total_quantity(),
            requested_quantity,
            message,
        }
    }
}

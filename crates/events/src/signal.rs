use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ProductId, SellerId};

use crate::event::Event;

pub const LOW_STOCK_EVENT_TYPE: &str = "stock.low_stock";

/// Signal consumed by the notification service when a product runs low.
///
/// `product_name` and `seller_id` are catalog context passed through as-is;
/// the ledger does not validate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockSignal {
    pub product_id: ProductId,
    pub product_name: String,
    pub seller_id: Option<SellerId>,
    pub current_stock: u64,
    pub threshold: u64,
    pub occurred_at: DateTime<Utc>,
}

impl Event for LowStockSignal {
    fn event_type(&self) -> &'static str {
        LOW_STOCK_EVENT_TYPE
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

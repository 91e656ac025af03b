use std::sync::Arc;

use thiserror::Error;

use stockledger_core::{LedgerError, ProductId};
use stockledger_inventory::StockRecord;

/// Stock store operation error.
///
/// These are **infrastructure errors**; business failures (insufficient stock,
/// invalid state) never originate here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("stock record already exists for product {0}")]
    AlreadyExists(ProductId),

    #[error("no stock record for product {0}")]
    Missing(ProductId),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::AlreadyExists(id) => LedgerError::AlreadyExists(id),
            StoreError::Missing(id) => LedgerError::NotFound(id),
            StoreError::Poisoned => LedgerError::unavailable("store lock poisoned"),
            StoreError::Backend(msg) => LedgerError::Unavailable(msg),
        }
    }
}

/// Persistence boundary for stock records.
///
/// Implementations must:
/// - make `insert` atomic with respect to concurrent inserts of the same product
///   (exactly one wins, the rest get `AlreadyExists`)
/// - make `save` replace the whole record at once, so `load`/`list` only ever
///   observe committed records (read-committed)
///
/// `save` performs no conflict detection of its own. It must only be called
/// from inside the exclusive-access scope for that product
/// (see [`crate::concurrency::ExclusiveAccess`]).
pub trait StockStore: Send + Sync {
    fn insert(&self, record: StockRecord) -> Result<(), StoreError>;

    fn load(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError>;

    fn save(&self, record: StockRecord) -> Result<(), StoreError>;

    /// All records, ordered by product id.
    fn list(&self) -> Result<Vec<StockRecord>, StoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn insert(&self, record: StockRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn load(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError> {
        (**self).load(product_id)
    }

    fn save(&self, record: StockRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        (**self).list()
    }
}

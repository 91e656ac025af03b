//! Catalog context used to enrich low-stock signals.
//!
//! The catalog service owns product names and sellers; the ledger only keeps
//! a lookup so the signal can carry them through.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use stockledger_core::{ProductId, SellerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductContext {
    pub name: String,
    pub seller_id: Option<SellerId>,
}

/// Read-only view of catalog data.
pub trait ProductCatalog: Send + Sync {
    fn describe(&self, product_id: ProductId) -> Option<ProductContext>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn describe(&self, product_id: ProductId) -> Option<ProductContext> {
        (**self).describe(product_id)
    }
}

/// In-memory catalog, populated from whatever context callers hand us.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<HashMap<ProductId, ProductContext>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product_id: ProductId, context: ProductContext) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(product_id, context);
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn describe(&self, product_id: ProductId) -> Option<ProductContext> {
        let map = self.inner.read().ok()?;
        map.get(&product_id).cloned()
    }
}

use std::collections::BTreeMap;
use std::sync::RwLock;

use stockledger_core::ProductId;
use stockledger_inventory::StockRecord;

use super::r#trait::{StockStore, StoreError};

/// In-memory stock store.
///
/// Intended for tests/dev. Records are replaced wholesale under the write
/// lock, so readers never see a half-applied mutation.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    records: RwLock<BTreeMap<ProductId, StockRecord>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn insert(&self, record: StockRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;

        let product_id = record.product_id();
        if records.contains_key(&product_id) {
            return Err(StoreError::AlreadyExists(product_id));
        }
        records.insert(product_id, record);
        Ok(())
    }

    fn load(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&product_id).cloned())
    }

    fn save(&self, record: StockRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;

        match records.get_mut(&record.product_id()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StoreError::Missing(record.product_id())),
        }
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(id: u64, qty: u64) -> StockRecord {
        StockRecord::create(ProductId::new(id), qty, 10, Utc::now()).unwrap()
    }

    #[test]
    fn insert_twice_is_already_exists() {
        let store = InMemoryStockStore::new();
        store.insert(record(1, 5)).unwrap();

        let err = store.insert(record(1, 9)).unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists(ProductId::new(1)));
        assert_eq!(store.load(ProductId::new(1)).unwrap().unwrap().total_quantity(), 5);
    }

    #[test]
    fn save_requires_existing_record() {
        let store = InMemoryStockStore::new();
        let err = store.save(record(2, 1)).unwrap_err();
        assert_eq!(err, StoreError::Missing(ProductId::new(2)));
    }

    #[test]
    fn list_is_ordered_by_product_id() {
        let store = InMemoryStockStore::new();
        for id in [30, 10, 20] {
            store.insert(record(id, 1)).unwrap();
        }

        let ids: Vec<u64> = store.list().unwrap().iter().map(|r| r.product_id().get()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}

use std::time::Duration;

use stockledger_core::{LedgerError, LedgerResult, ProductId};
use stockledger_inventory::StockRecord;

use crate::store::StockStore;

use super::keyed_locks::KeyedLocks;

/// A committed mutation: the record as it was and as it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTransition {
    pub before: StockRecord,
    pub after: StockRecord,
}

impl StockTransition {
    /// The mutation moved the record from above threshold to at/below it.
    pub fn entered_low_stock(&self) -> bool {
        self.after.is_low_stock() && !self.before.is_low_stock()
    }
}

/// Sole write path for stock records.
///
/// Every write goes through [`ExclusiveAccess::with_exclusive_access`]: take the
/// product's lock, read the committed record, compute the next record with a
/// pure function, persist it, run the post-commit hook, release. Readers go
/// straight to the store and never queue behind mutators.
#[derive(Debug)]
pub struct ExclusiveAccess<S> {
    store: S,
    locks: KeyedLocks<ProductId>,
    lock_timeout: Option<Duration>,
}

impl<S> ExclusiveAccess<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            lock_timeout: None,
        }
    }

    /// Bound the wait for a product's lock. Expiry surfaces as `LockTimeout`.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &KeyedLocks<ProductId> {
        &self.locks
    }
}

impl<S> ExclusiveAccess<S>
where
    S: StockStore,
{
    /// Persist a brand-new record under its product's lock.
    pub fn create(&self, record: StockRecord) -> LedgerResult<StockRecord> {
        self.create_with(record, |_| {})
    }

    /// Like [`create`](Self::create), running `on_created` before the lock is
    /// released so no mutator of the new product can observe it first.
    pub fn create_with<C>(&self, record: StockRecord, on_created: C) -> LedgerResult<StockRecord>
    where
        C: FnOnce(&StockRecord),
    {
        let product_id = record.product_id();
        record.check_invariant()?;

        self.locked(product_id, || {
            self.store.insert(record.clone())?;
            on_created(&record);
            Ok(record)
        })
    }

    /// Read-modify-write one product's record atomically with respect to every
    /// other mutator of the same product.
    ///
    /// `mutate` sees the committed record and returns its successor (or an
    /// error, in which case nothing is written). `on_commit` runs after the
    /// successor is persisted and before the lock is released; it cannot undo
    /// the write.
    pub fn with_exclusive_access<F, C>(
        &self,
        product_id: ProductId,
        mutate: F,
        on_commit: C,
    ) -> LedgerResult<StockTransition>
    where
        F: FnOnce(&StockRecord) -> LedgerResult<StockRecord>,
        C: FnOnce(&StockTransition),
    {
        // Records are never removed: an id absent here stays absent and gets no lock slot.
        if self.store.load(product_id)?.is_none() {
            return Err(LedgerError::NotFound(product_id));
        }

        self.locked(product_id, || {
            tracing::debug!(product_id = %product_id, "exclusive access acquired");

            let before = self
                .store
                .load(product_id)?
                .ok_or(LedgerError::NotFound(product_id))?;

            let after = mutate(&before)?;
            if after.product_id() != product_id {
                return Err(LedgerError::internal(format!(
                    "mutation of product {product_id} produced a record for product {}",
                    after.product_id()
                )));
            }
            after.check_invariant()?;

            self.store.save(after.clone())?;

            let transition = StockTransition { before, after };
            on_commit(&transition);
            Ok(transition)
        })
    }

    /// Committed snapshot of one record (no exclusive lock).
    pub fn read(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        self.store
            .load(product_id)?
            .ok_or(LedgerError::NotFound(product_id))
    }

    /// Committed snapshots of all records (no exclusive lock).
    pub fn read_all(&self) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.store.list()?)
    }

    fn locked<T>(
        &self,
        product_id: ProductId,
        f: impl FnOnce() -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        self.locks
            .with_lock(product_id, self.lock_timeout, f)
            .map_err(|_| {
                tracing::warn!(
                    product_id = %product_id,
                    timeout_ms = self.lock_timeout.map(|t| t.as_millis() as u64),
                    "timed out waiting for exclusive access"
                );
                LedgerError::LockTimeout(product_id)
            })?
    }
}

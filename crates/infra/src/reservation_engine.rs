//! Reservation engine (application-level orchestration).
//!
//! Entry point for the order workflow. Each mutating operation runs this
//! pipeline for one product:
//!
//! ```text
//! request
//!   ↓
//! 1. Acquire the product's exclusive lock (may block; optional deadline)
//!   ↓
//! 2. Load the committed record
//!   ↓
//! 3. Compute the next record (pure transition, may reject)
//!   ↓
//! 4. Persist the next record
//!   ↓
//! 5. Low-stock policy → emitter (best-effort, failures logged)
//!   ↓
//! 6. Release the lock, return the snapshot
//! ```
//!
//! Reads (`get_stock`, `check_availability`, `list_low_stock`) skip the lock
//! and observe committed records only.
//!
//! The engine tracks aggregate counters, not individual reservations, and
//! performs no de-duplication: callers retrying `reserve`/`release`/
//! `confirm_sale` must make those retries idempotent on their side (for
//! example keyed by order id).

use std::time::Duration;

use chrono::Utc;

use stockledger_core::{LedgerError, LedgerResult, ProductId};
use stockledger_inventory::{Availability, DEFAULT_LOW_STOCK_THRESHOLD, StockCommand, StockRecord};

use crate::concurrency::{ExclusiveAccess, StockTransition};
use crate::config::LedgerConfig;
use crate::signal::{LowStockEmitter, LowStockPolicy};
use crate::store::StockStore;

/// Sole writer of stock records.
///
/// ## Generic Parameters
///
/// - `S`: stock store (in-memory for tests/dev)
/// - `E`: low-stock emitter (bus-backed, or a test double)
#[derive(Debug)]
pub struct ReservationEngine<S, E> {
    access: ExclusiveAccess<S>,
    emitter: E,
    policy: LowStockPolicy,
    default_threshold: u64,
}

impl<S, E> ReservationEngine<S, E> {
    pub fn new(store: S, emitter: E) -> Self {
        Self {
            access: ExclusiveAccess::new(store),
            emitter,
            policy: LowStockPolicy::default(),
            default_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Apply the ledger-relevant parts of a loaded configuration.
    pub fn configured(store: S, emitter: E, config: &LedgerConfig) -> Self {
        Self::new(store, emitter)
            .with_lock_timeout(config.lock_timeout)
            .with_policy(config.low_stock_policy)
            .with_default_threshold(config.default_low_stock_threshold)
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.access = self.access.with_lock_timeout(timeout);
        self
    }

    pub fn with_policy(mut self, policy: LowStockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_threshold(mut self, threshold: u64) -> Self {
        self.default_threshold = threshold.max(1);
        self
    }

    pub fn policy(&self) -> LowStockPolicy {
        self.policy
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn access(&self) -> &ExclusiveAccess<S> {
        &self.access
    }
}

impl<S, E> ReservationEngine<S, E>
where
    S: StockStore,
    E: LowStockEmitter,
{
    /// Create the record for a product. `threshold = None` uses the configured default.
    pub fn create_stock(
        &self,
        product_id: ProductId,
        quantity: u64,
        threshold: Option<u64>,
    ) -> LedgerResult<StockRecord> {
        self.create_stock_with(product_id, quantity, threshold, |_| {})
    }

    /// [`create_stock`](Self::create_stock) with a hook that runs before any
    /// mutator can see the new record (e.g. registering catalog context).
    pub fn create_stock_with<C>(
        &self,
        product_id: ProductId,
        quantity: u64,
        threshold: Option<u64>,
        on_created: C,
    ) -> LedgerResult<StockRecord>
    where
        C: FnOnce(&StockRecord),
    {
        let threshold = threshold.unwrap_or(self.default_threshold);
        let record = StockRecord::create(product_id, quantity, threshold, Utc::now())?;

        let created = self.access.create_with(record, on_created).inspect_err(|e| {
            tracing::info!(product_id = %product_id, error = %e, "stock creation rejected");
        })?;

        tracing::info!(
            product_id = %product_id,
            quantity,
            threshold,
            "stock record created"
        );
        Ok(created)
    }

    pub fn get_stock(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        self.access.read(product_id)
    }

    pub fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u64,
    ) -> LedgerResult<Availability> {
        if quantity == 0 {
            return Err(LedgerError::validation("quantity must be >= 1"));
        }
        let record = self.access.read(product_id)?;
        Ok(Availability::of(&record, quantity))
    }

    /// Hold `quantity` units for an in-flight order.
    pub fn reserve(&self, product_id: ProductId, quantity: u64) -> LedgerResult<StockRecord> {
        self.execute(product_id, StockCommand::Reserve { quantity })
    }

    /// Payment completed: held units leave the ledger.
    pub fn confirm_sale(&self, product_id: ProductId, quantity: u64) -> LedgerResult<StockRecord> {
        self.execute(product_id, StockCommand::ConfirmSale { quantity })
    }

    /// Order cancelled before payment: held units become available again.
    pub fn release(&self, product_id: ProductId, quantity: u64) -> LedgerResult<StockRecord> {
        self.execute(product_id, StockCommand::Release { quantity })
    }

    /// Replenishment.
    pub fn add_stock(&self, product_id: ProductId, quantity: u64) -> LedgerResult<StockRecord> {
        self.execute(product_id, StockCommand::AddStock { quantity })
    }

    /// Every record currently at or below its threshold, ordered by product id.
    pub fn list_low_stock(&self) -> LedgerResult<Vec<StockRecord>> {
        let mut records = self.access.read_all()?;
        records.retain(StockRecord::is_low_stock);
        Ok(records)
    }

    /// Run one command through the exclusive-access pipeline.
    pub fn execute(&self, product_id: ProductId, command: StockCommand) -> LedgerResult<StockRecord> {
        let transition = self
            .access
            .with_exclusive_access(
                product_id,
                |current| current.apply(&command, Utc::now()),
                |transition| self.after_commit(transition),
            )
            .inspect_err(|e| {
                tracing::info!(
                    product_id = %product_id,
                    op = command.name(),
                    quantity = command.quantity(),
                    error = %e,
                    "stock operation rejected"
                );
            })?;

        let after = &transition.after;
        tracing::info!(
            product_id = %product_id,
            op = command.name(),
            quantity = command.quantity(),
            available = after.available_quantity(),
            reserved = after.reserved_quantity(),
            total = after.total_quantity(),
            version = after.version(),
            "stock operation committed"
        );

        Ok(transition.after)
    }

    // Runs under the product's lock. Must not fail the operation.
    fn after_commit(&self, transition: &StockTransition) {
        if !self.policy.should_emit(transition) {
            return;
        }

        let record = &transition.after;
        tracing::warn!(
            product_id = %record.product_id(),
            available = record.available_quantity(),
            threshold = record.low_stock_threshold(),
            "low stock"
        );

        if let Err(e) = self.emitter.emit(record) {
            tracing::warn!(
                product_id = %record.product_id(),
                error = %e,
                "low stock signal not delivered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::signal::EmitError;
    use crate::store::InMemoryStockStore;

    /// Records every emitted snapshot; optionally fails after recording.
    #[derive(Debug, Default)]
    struct RecordingEmitter {
        seen: Mutex<Vec<StockRecord>>,
        fail: bool,
    }

    impl RecordingEmitter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn seen(&self) -> Vec<StockRecord> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl LowStockEmitter for RecordingEmitter {
        fn emit(&self, record: &StockRecord) -> Result<(), EmitError> {
            self.seen.lock().unwrap().push(record.clone());
            if self.fail {
                return Err(EmitError::Publish("broker down".to_string()));
            }
            Ok(())
        }
    }

    type TestEngine = ReservationEngine<InMemoryStockStore, Arc<RecordingEmitter>>;

    fn engine() -> (TestEngine, Arc<RecordingEmitter>) {
        let emitter = Arc::new(RecordingEmitter::default());
        (ReservationEngine::new(InMemoryStockStore::new(), emitter.clone()), emitter)
    }

    fn p1() -> ProductId {
        ProductId::new(1)
    }

    fn counts(r: &StockRecord) -> (u64, u64, u64) {
        (r.available_quantity(), r.reserved_quantity(), r.total_quantity())
    }

    #[test]
    fn walkthrough_create_reserve_confirm_reserve_release() {
        let (engine, emitter) = engine();

        let r = engine.create_stock(p1(), 100, Some(10)).unwrap();
        assert_eq!(counts(&r), (100, 0, 100));
        assert!(!r.is_low_stock());

        let r = engine.reserve(p1(), 30).unwrap();
        assert_eq!(counts(&r), (70, 30, 100));

        let r = engine.confirm_sale(p1(), 30).unwrap();
        assert_eq!(counts(&r), (70, 0, 70));
        assert!(emitter.seen().is_empty());

        let r = engine.reserve(p1(), 65).unwrap();
        assert_eq!(counts(&r), (5, 65, 70));
        assert!(r.is_low_stock());

        let seen = emitter.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].product_id(), p1());
        assert_eq!(seen[0].available_quantity(), 5);
        assert_eq!(seen[0].low_stock_threshold(), 10);

        let err = engine.release(p1(), 70).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidState {
                product_id: p1(),
                reserved: 65,
                requested: 70
            }
        );

        let r = engine.release(p1(), 5).unwrap();
        assert_eq!(counts(&r), (10, 60, 70));
        // Still low, but no new crossing under the default policy.
        assert_eq!(emitter.seen().len(), 1);
    }

    #[test]
    fn missing_product_is_not_found_everywhere() {
        let (engine, _) = engine();
        let id = ProductId::new(404);

        assert_eq!(engine.get_stock(id).unwrap_err(), LedgerError::NotFound(id));
        assert_eq!(engine.check_availability(id, 1).unwrap_err(), LedgerError::NotFound(id));
        for err in [
            engine.reserve(id, 1).unwrap_err(),
            engine.confirm_sale(id, 1).unwrap_err(),
            engine.release(id, 1).unwrap_err(),
            engine.add_stock(id, 1).unwrap_err(),
        ] {
            assert_eq!(err, LedgerError::NotFound(id));
        }
    }

    #[test]
    fn operations_on_unknown_products_leave_no_lock_slots() {
        let (engine, _) = engine();
        for raw in 1..=10_000 {
            assert_eq!(
                engine.reserve(ProductId::new(raw), 1).unwrap_err(),
                LedgerError::NotFound(ProductId::new(raw))
            );
        }
        assert!(engine.access().locks().is_empty());

        engine.create_stock(p1(), 5, None).unwrap();
        engine.reserve(p1(), 1).unwrap();
        assert_eq!(engine.access().locks().len(), 1);
    }

    #[test]
    fn create_hook_sees_record_before_first_mutation() {
        let (engine, _) = engine();
        let mut seen = None;

        engine
            .create_stock_with(p1(), 20, Some(5), |r| seen = Some(r.version()))
            .unwrap();
        assert_eq!(seen, Some(1));

        // A failed create runs no hook.
        let mut ran = false;
        let err = engine.create_stock_with(p1(), 1, None, |_| ran = true).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyExists(p1()));
        assert!(!ran);
    }

    #[test]
    fn second_create_is_already_exists_and_keeps_original() {
        let (engine, _) = engine();
        engine.create_stock(p1(), 5, None).unwrap();

        let err = engine.create_stock(p1(), 500, None).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyExists(p1()));
        assert_eq!(engine.get_stock(p1()).unwrap().total_quantity(), 5);
    }

    #[test]
    fn omitted_threshold_uses_configured_default() {
        let (engine, _) = engine();
        let r = engine.create_stock(p1(), 5, None).unwrap();
        assert_eq!(r.low_stock_threshold(), DEFAULT_LOW_STOCK_THRESHOLD);

        let engine = engine.with_default_threshold(3);
        let r = engine.create_stock(ProductId::new(2), 5, None).unwrap();
        assert_eq!(r.low_stock_threshold(), 3);
    }

    #[test]
    fn zero_quantities_are_validation_errors() {
        let (engine, _) = engine();
        engine.create_stock(p1(), 5, None).unwrap();

        assert!(matches!(engine.reserve(p1(), 0), Err(LedgerError::Validation(_))));
        assert!(matches!(engine.check_availability(p1(), 0), Err(LedgerError::Validation(_))));
        assert!(matches!(
            engine.create_stock(ProductId::new(2), 5, Some(0)),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn check_availability_does_not_mutate() {
        let (engine, _) = engine();
        engine.create_stock(p1(), 10, Some(2)).unwrap();
        engine.reserve(p1(), 4).unwrap();
        let before = engine.get_stock(p1()).unwrap();

        let a = engine.check_availability(p1(), 7).unwrap();
        assert!(!a.available);
        assert_eq!(a.available_quantity, 6);
        assert_eq!(a.reserved_quantity, 4);
        assert!(engine.check_availability(p1(), 6).unwrap().available);
        assert_eq!(engine.get_stock(p1()).unwrap(), before);
    }

    #[test]
    fn list_low_stock_uses_inclusive_boundary() {
        let (engine, _) = engine();
        engine.create_stock(ProductId::new(3), 10, Some(10)).unwrap();
        engine.create_stock(ProductId::new(1), 11, Some(10)).unwrap();
        engine.create_stock(ProductId::new(2), 0, Some(1)).unwrap();

        let low: Vec<u64> = engine
            .list_low_stock()
            .unwrap()
            .iter()
            .map(|r| r.product_id().get())
            .collect();
        assert_eq!(low, vec![2, 3]);
    }

    #[test]
    fn emitter_failure_does_not_roll_back() {
        let emitter = Arc::new(RecordingEmitter::failing());
        let engine = ReservationEngine::new(InMemoryStockStore::new(), emitter.clone());
        engine.create_stock(p1(), 20, Some(10)).unwrap();

        let r = engine.reserve(p1(), 15).unwrap();
        assert_eq!(r.available_quantity(), 5);
        assert_eq!(emitter.seen().len(), 1);
        assert_eq!(engine.get_stock(p1()).unwrap(), r);
    }

    #[test]
    fn while_low_policy_signals_every_low_mutation() {
        let (engine, emitter) = engine();
        let engine = engine.with_policy(LowStockPolicy::WhileLow);
        engine.create_stock(p1(), 12, Some(10)).unwrap();

        engine.reserve(p1(), 4).unwrap(); // 8: crossing
        engine.reserve(p1(), 1).unwrap(); // 7: still low
        engine.confirm_sale(p1(), 5).unwrap(); // available unchanged, still low
        engine.add_stock(p1(), 20).unwrap(); // 27: recovered

        assert_eq!(emitter.seen().len(), 3);
    }

    #[test]
    fn replenishment_out_of_low_stock_emits_nothing() {
        let (engine, emitter) = engine();
        engine.create_stock(p1(), 3, Some(10)).unwrap();

        let r = engine.add_stock(p1(), 50).unwrap();
        assert_eq!(counts(&r), (53, 0, 53));
        assert!(!r.is_low_stock());
        assert!(emitter.seen().is_empty());
    }

    #[test]
    fn configured_applies_config_values() {
        let config = LedgerConfig {
            lock_timeout: Some(Duration::from_millis(5)),
            low_stock_policy: LowStockPolicy::WhileLow,
            default_low_stock_threshold: 4,
            ..LedgerConfig::default()
        };
        let engine = ReservationEngine::configured(
            InMemoryStockStore::new(),
            Arc::new(RecordingEmitter::default()),
            &config,
        );

        assert_eq!(engine.policy(), LowStockPolicy::WhileLow);
        assert_eq!(engine.access().lock_timeout(), Some(Duration::from_millis(5)));
        assert_eq!(engine.create_stock(p1(), 9, None).unwrap().low_stock_threshold(), 4);
    }
}

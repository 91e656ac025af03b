use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult, ProductId};

/// Threshold applied when the caller does not supply one on creation.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 10;

/// Per-product quantity state.
///
/// Invariant, before and after every transition:
/// `total == available + reserved` (non-negativity is carried by `u64`).
///
/// Transitions are pure: they take `&self` and return the next record, so the
/// caller decides when (and under which lock) the result becomes visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockRecord {
    product_id: ProductId,
    available_quantity: u64,
    reserved_quantity: u64,
    total_quantity: u64,
    low_stock_threshold: u64,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Build the initial record for a product: everything available, nothing held.
    pub fn create(
        product_id: ProductId,
        quantity: u64,
        low_stock_threshold: u64,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        if low_stock_threshold == 0 {
            return Err(LedgerError::validation("low stock threshold must be >= 1"));
        }

        Ok(Self {
            product_id,
            available_quantity: quantity,
            reserved_quantity: 0,
            total_quantity: quantity,
            low_stock_threshold,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn available_quantity(&self) -> u64 {
        self.available_quantity
    }

    pub fn reserved_quantity(&self) -> u64 {
        self.reserved_quantity
    }

    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    pub fn low_stock_threshold(&self) -> u64 {
        self.low_stock_threshold
    }

    /// Revision counter: 1 on creation, +1 per committed transition.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_available(&self, quantity: u64) -> bool {
        self.available_quantity >= quantity
    }

    /// Inclusive at the boundary.
    pub fn is_low_stock(&self) -> bool {
        self.available_quantity <= self.low_stock_threshold
    }

    /// Verify the counter invariant.
    pub fn check_invariant(&self) -> LedgerResult<()> {
        match self.available_quantity.checked_add(self.reserved_quantity) {
            Some(sum) if sum == self.total_quantity => Ok(()),
            _ => Err(LedgerError::internal(format!(
                "invariant broken for product {}: available {} + reserved {} != total {}",
                self.product_id, self.available_quantity, self.reserved_quantity, self.total_quantity
            ))),
        }
    }

    /// Move `quantity` units from available to reserved.
    pub fn reserve(&self, quantity: u64, now: DateTime<Utc>) -> LedgerResult<Self> {
        ensure_positive(quantity)?;
        if !self.is_available(quantity) {
            return Err(LedgerError::InsufficientStock {
                product_id: self.product_id,
                available: self.available_quantity,
                requested: quantity,
            });
        }

        let reserved = self.checked(self.reserved_quantity.checked_add(quantity))?;
        Ok(self.next(
            self.available_quantity - quantity,
            reserved,
            self.total_quantity,
            now,
        ))
    }

    /// Turn `quantity` reserved units into a completed sale (they leave the ledger).
    pub fn confirm_sale(&self, quantity: u64, now: DateTime<Utc>) -> LedgerResult<Self> {
        ensure_positive(quantity)?;
        self.ensure_reserved(quantity)?;

        Ok(self.next(
            self.available_quantity,
            self.reserved_quantity - quantity,
            self.total_quantity - quantity,
            now,
        ))
    }

    /// Return `quantity` reserved units to available.
    pub fn release(&self, quantity: u64, now: DateTime<Utc>) -> LedgerResult<Self> {
        ensure_positive(quantity)?;
        self.ensure_reserved(quantity)?;

        let available = self.checked(self.available_quantity.checked_add(quantity))?;
        Ok(self.next(
            available,
            self.reserved_quantity - quantity,
            self.total_quantity,
            now,
        ))
    }

    /// Replenish: new units are immediately available.
    pub fn add_stock(&self, quantity: u64, now: DateTime<Utc>) -> LedgerResult<Self> {
        ensure_positive(quantity)?;

        let available = self.checked(self.available_quantity.checked_add(quantity))?;
        let total = self.checked(self.total_quantity.checked_add(quantity))?;
        Ok(self.next(available, self.reserved_quantity, total, now))
    }

    /// Dispatch a command to the matching transition.
    pub fn apply(&self, command: &StockCommand, now: DateTime<Utc>) -> LedgerResult<Self> {
        match *command {
            StockCommand::Reserve { quantity } => self.reserve(quantity, now),
            StockCommand::ConfirmSale { quantity } => self.confirm_sale(quantity, now),
            StockCommand::Release { quantity } => self.release(quantity, now),
            StockCommand::AddStock { quantity } => self.add_stock(quantity, now),
        }
    }

    fn ensure_reserved(&self, quantity: u64) -> LedgerResult<()> {
        if self.reserved_quantity < quantity {
            return Err(LedgerError::InvalidState {
                product_id: self.product_id,
                reserved: self.reserved_quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    fn checked(&self, value: Option<u64>) -> LedgerResult<u64> {
        value.ok_or_else(|| {
            LedgerError::validation(format!("quantity overflow for product {}", self.product_id))
        })
    }

    fn next(&self, available: u64, reserved: u64, total: u64, now: DateTime<Utc>) -> Self {
        Self {
            available_quantity: available,
            reserved_quantity: reserved,
            total_quantity: total,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        }
    }
}

fn ensure_positive(quantity: u64) -> LedgerResult<()> {
    if quantity == 0 {
        return Err(LedgerError::validation("quantity must be >= 1"));
    }
    Ok(())
}

/// A mutating request against one product's record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StockCommand {
    Reserve { quantity: u64 },
    ConfirmSale { quantity: u64 },
    Release { quantity: u64 },
    AddStock { quantity: u64 },
}

impl StockCommand {
    /// Stable operation name (logs, metrics labels).
    pub fn name(&self) -> &'static str {
        match self {
            StockCommand::Reserve { .. } => "reserve",
            StockCommand::ConfirmSale { .. } => "confirm_sale",
            StockCommand::Release { .. } => "release",
            StockCommand::AddStock { .. } => "add_stock",
        }
    }

    pub fn quantity(&self) -> u64 {
        match *self {
            StockCommand::Reserve { quantity }
            | StockCommand::ConfirmSale { quantity }
            | StockCommand::Release { quantity }
            | StockCommand::AddStock { quantity } => quantity,
        }
    }
}

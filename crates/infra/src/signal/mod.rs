//! Low-stock signal emission.
//!
//! The reservation engine hands every committed transition to a
//! [`LowStockPolicy`]; when the policy says so, the updated record goes to a
//! [`LowStockEmitter`]. Emission is a best-effort side channel: failures are
//! returned to the engine, which logs them and moves on.

pub mod emitter;

pub use emitter::{BusSignalEmitter, EmitError, LowStockEmitter};

use core::str::FromStr;

use crate::concurrency::StockTransition;

/// When a committed mutation should produce a signal.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LowStockPolicy {
    /// Only when the mutation moves the record from above threshold to at/below it.
    #[default]
    OnCrossing,
    /// After every mutation that leaves the record at/below threshold.
    WhileLow,
}

impl LowStockPolicy {
    pub fn should_emit(self, transition: &StockTransition) -> bool {
        match self {
            LowStockPolicy::OnCrossing => transition.entered_low_stock(),
            LowStockPolicy::WhileLow => transition.after.is_low_stock(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LowStockPolicy::OnCrossing => "on_crossing",
            LowStockPolicy::WhileLow => "while_low",
        }
    }
}

impl FromStr for LowStockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on_crossing" => Ok(LowStockPolicy::OnCrossing),
            "while_low" => Ok(LowStockPolicy::WhileLow),
            other => Err(format!(
                "unknown low stock policy '{other}' (expected on_crossing or while_low)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stockledger_core::ProductId;
    use stockledger_inventory::StockRecord;

    use super::*;

    fn transition(available_before: u64, reserve: u64) -> StockTransition {
        let before = StockRecord::create(ProductId::new(1), available_before, 10, Utc::now()).unwrap();
        let after = before.reserve(reserve, Utc::now()).unwrap();
        StockTransition { before, after }
    }

    #[test]
    fn on_crossing_fires_only_on_entry() {
        assert!(LowStockPolicy::OnCrossing.should_emit(&transition(70, 65)));
        assert!(LowStockPolicy::OnCrossing.should_emit(&transition(11, 1)));
        assert!(!LowStockPolicy::OnCrossing.should_emit(&transition(9, 1)));
        assert!(!LowStockPolicy::OnCrossing.should_emit(&transition(50, 1)));
    }

    #[test]
    fn while_low_fires_on_every_low_result() {
        assert!(LowStockPolicy::WhileLow.should_emit(&transition(9, 1)));
        assert!(LowStockPolicy::WhileLow.should_emit(&transition(70, 65)));
        assert!(!LowStockPolicy::WhileLow.should_emit(&transition(50, 1)));
    }

    #[test]
    fn policy_parses_config_values() {
        assert_eq!("on_crossing".parse::<LowStockPolicy>(), Ok(LowStockPolicy::OnCrossing));
        assert_eq!(" While_Low ".parse::<LowStockPolicy>(), Ok(LowStockPolicy::WhileLow));
        assert!("always".parse::<LowStockPolicy>().is_err());
    }
}

//! Trading strategy implementation.
//!
//! Contains the core logic for:
//! - The per-tick reconciliation loop over the four tracked order slots
//! - Deficit/surplus/total netting across hedge-order lifecycles
//! - Price-bound evaluation for drift-triggered cancellation
//! - Generic market-making helpers (startup sweeps, order logging)

mod bounds;
mod market_maker;
mod single_order;
mod state;

pub use bounds::should_cancel;
pub use market_maker::MarketMaker;
pub use single_order::SingleOrderStrategy;
pub use state::{NettingLedger, NettingSide, OrderClass, OrderSlot, ReconciliationState, Side};

use crate::config::StrategyConfig;
use crate::exchange::MarketGateway;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The closed set of strategy variants, selected by configuration at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    SingleOrder,
}

/// A configured strategy instance.
pub enum Strategy {
    SingleOrder(SingleOrderStrategy),
}

impl Strategy {
    /// Build the selected strategy variant from validated configuration.
    pub fn from_config(kind: StrategyKind, config: StrategyConfig) -> Result<Self> {
        match kind {
            StrategyKind::SingleOrder => {
                Ok(Strategy::SingleOrder(SingleOrderStrategy::new(config)?))
            }
        }
    }

    /// Canonical identifier of the market this strategy trades.
    pub fn market_id(&self) -> &str {
        match self {
            Strategy::SingleOrder(s) => s.market_id(),
        }
    }

    /// Run one tick against the given market price, returning the updated
    /// reconciliation state.
    pub async fn execute<G: MarketGateway>(
        &self,
        gateway: &G,
        state: ReconciliationState,
        market_price: Decimal,
    ) -> ReconciliationState {
        match self {
            Strategy::SingleOrder(s) => s.execute(gateway, state, market_price).await,
        }
    }
}

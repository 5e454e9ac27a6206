//! The gateway boundary the strategy layer is written against.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::types::{Market, OwnOrders, PlaceOrder, PlacedOrder};

/// Order placement, cancellation, and book queries against a venue.
///
/// Every call may fail with a transport-level error; the strategy treats
/// such failures as recoverable within the current tick (log and continue,
/// retried naturally on the next tick).
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// List all tradable markets.
    async fn get_markets(&self) -> anyhow::Result<Vec<Market>>;

    /// Latest closing price for a market.
    async fn get_market_price(&self, market_id: &str) -> anyhow::Result<Decimal>;

    /// The caller's currently resting orders for a market.
    async fn get_own_orders(&self, market_id: &str) -> anyhow::Result<OwnOrders>;

    /// Submit a limit order. Returns the order reference and on-chain identity.
    async fn place_order(&self, params: PlaceOrder) -> anyhow::Result<PlacedOrder>;

    /// Cancel a resting order by its output reference.
    async fn cancel_order(&self, order_reference: &str) -> anyhow::Result<()>;

    /// Available balances per asset for the bot's own address.
    async fn get_balances(&self) -> anyhow::Result<HashMap<String, Decimal>>;
}

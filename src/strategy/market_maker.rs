//! Generic market-making helpers for a single market.
//!
//! Balance-capped single-sided placement and per-side cancellation sweeps,
//! shared by strategies that do not need hedged netting. The reconciliation
//! strategy uses the sweep to clear pre-existing venue orders at startup.

use crate::config::StrategyConfig;
use crate::exchange::{MarketGateway, PlaceOrder};
use crate::utils::decimal::floor_units;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// Places, cancels, and logs orders for one configured market.
pub struct MarketMaker {
    market_id: String,
    base_asset: String,
    target_asset: String,
    /// Maximum order size in smallest base-asset units
    position_size: Decimal,
}

impl MarketMaker {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            market_id: config.market_id(),
            base_asset: config.base_asset.clone(),
            target_asset: config.target_asset.clone(),
            position_size: config.base_amount,
        }
    }

    /// Place a buy order at the given price, capped by the available
    /// base-asset balance.
    pub async fn place_buy_order<G: MarketGateway>(&self, gateway: &G, price: Decimal) {
        let balance = match gateway.get_balances().await {
            Ok(balances) => balances
                .get(&self.base_asset)
                .copied()
                .unwrap_or(Decimal::ZERO),
            Err(e) => {
                error!(error = %e, "Could not fetch balances for BUY order");
                return;
            }
        };

        let order_size = self.position_size.min(balance);
        if order_size <= Decimal::ZERO {
            warn!(market = %self.market_id, "Insufficient balance to place BUY order");
            return;
        }

        let offered = floor_units(order_size);
        let price_amount = floor_units(offered / price);
        info!(market = %self.market_id, amount = %offered, %price, "Placing BUY order");

        let params = PlaceOrder::new(offered, &self.base_asset, &self.target_asset, price_amount);
        match gateway.place_order(params).await {
            Ok(placed) => info!(order_ref = %placed.order_ref, "Placed BUY order"),
            Err(e) => error!(error = %e, "Could not place BUY order"),
        }
    }

    /// Place a sell order at the given price, capped by the available
    /// target-asset balance.
    pub async fn place_sell_order<G: MarketGateway>(&self, gateway: &G, price: Decimal) {
        let balance = match gateway.get_balances().await {
            Ok(balances) => balances
                .get(&self.target_asset)
                .copied()
                .unwrap_or(Decimal::ZERO),
            Err(e) => {
                error!(error = %e, "Could not fetch balances for SELL order");
                return;
            }
        };

        let order_size = (self.position_size / price).min(balance);
        if order_size <= Decimal::ZERO {
            warn!(market = %self.market_id, "Insufficient balance to place SELL order");
            return;
        }

        let offered = floor_units(order_size);
        let price_amount = floor_units(order_size * price);
        info!(market = %self.market_id, amount = %offered, %price, "Placing SELL order");

        let params = PlaceOrder::new(offered, &self.target_asset, &self.base_asset, price_amount);
        match gateway.place_order(params).await {
            Ok(placed) => info!(order_ref = %placed.order_ref, "Placed SELL order"),
            Err(e) => error!(error = %e, "Could not place SELL order"),
        }
    }

    /// Cancel every resting own order on the market, both sides.
    ///
    /// Failures are logged and skipped; returns the number of successful
    /// cancellations.
    pub async fn cancel_all<G: MarketGateway>(&self, gateway: &G) -> usize {
        let own_orders = match gateway.get_own_orders(&self.market_id).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "Could not fetch own orders for cancellation sweep");
                return 0;
            }
        };

        let mut cancelled = 0;
        for order in own_orders.asks.iter().chain(own_orders.bids.iter()) {
            info!(output_reference = %order.output_reference, "Cancelling order");
            match gateway.cancel_order(&order.output_reference).await {
                Ok(()) => {
                    info!(output_reference = %order.output_reference, "Cancelled order");
                    cancelled += 1;
                }
                Err(e) => {
                    error!(
                        output_reference = %order.output_reference,
                        error = %e,
                        "Could not cancel order"
                    );
                }
            }
        }
        cancelled
    }

    /// Log all resting own orders for the market.
    pub async fn log_orders<G: MarketGateway>(&self, gateway: &G) {
        let own_orders = match gateway.get_own_orders(&self.market_id).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "Could not fetch own orders");
                return;
            }
        };

        if own_orders.asks.is_empty() && own_orders.bids.is_empty() {
            info!(market = %self.market_id, "No resting orders");
            return;
        }

        for order in &own_orders.asks {
            info!(output_reference = %order.output_reference, "SELL order resting");
        }
        for order in &own_orders.bids {
            info!(output_reference = %order.output_reference, "BUY order resting");
        }
    }
}

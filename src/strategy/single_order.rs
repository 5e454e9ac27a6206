//! Paired actual/hedge order reconciliation.
//!
//! Maintains a two-sided market-making position with four tracked order
//! slots: actual orders quote around the market price, hedge orders
//! neutralize inventory when an actual order fills. Leftover amounts from
//! cancelled hedge orders are netted into the next actual order of the same
//! flow so that inventory does not silently leak.

use crate::config::StrategyConfig;
use crate::exchange::{MarketGateway, OrderInfo, PlaceOrder};
use crate::strategy::bounds::should_cancel;
use crate::strategy::market_maker::MarketMaker;
use crate::strategy::state::{OrderClass, ReconciliationState, Side};
use crate::utils::decimal::floor_units;
use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// The reconciliation strategy for one configured market.
///
/// Holds configuration only; all mutable state lives in the
/// [`ReconciliationState`] threaded through [`Self::execute`].
pub struct SingleOrderStrategy {
    config: StrategyConfig,
    market_id: String,
    maker: MarketMaker,
}

impl SingleOrderStrategy {
    /// Validate the configuration and build the strategy.
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        let market_id = config.market_id();
        let maker = MarketMaker::new(&config);

        info!("STRATEGY CONFIGURATION:");
        info!(" > base_asset             : {}", config.base_asset);
        info!(" > target_asset           : {}", config.target_asset);
        info!(" > market                 : {}", market_id);
        info!(" > base_amount            : {}", config.base_amount);
        info!(" > target_amount          : {}", config.target_amount);
        info!(" > limit                  : {}", config.limit);
        info!(" > order_level            : {}", config.order_level);
        info!(" > spread                 : {}", config.spread);
        info!(" > multiplier             : {}", config.multiplier);
        info!(" > actual_cancel_threshold: {}", config.actual_cancel_threshold);
        info!(" > hedge_cancel_threshold : {}", config.hedge_cancel_threshold);
        info!(" > std                    : {}", config.std);

        Ok(Self {
            config,
            market_id,
            maker,
        })
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Run one tick: validate the market, sweep pre-existing orders on the
    /// first invocation, then reconcile against the given market price.
    pub async fn execute<G: MarketGateway>(
        &self,
        gateway: &G,
        mut state: ReconciliationState,
        market_price: Decimal,
    ) -> ReconciliationState {
        match gateway.get_markets().await {
            Ok(markets) => {
                if !markets.iter().any(|m| m.market_id == self.market_id) {
                    warn!(market = %self.market_id, "Unknown market id, skipping tick");
                    return state;
                }
            }
            Err(e) => {
                // Recoverable: proceed on the assumption the market exists.
                error!(error = %e, "Could not list markets");
            }
        }

        if !state.swept {
            info!("First tick: sweeping pre-existing venue orders");
            self.maker.cancel_all(gateway).await;
            state.swept = true;
        }

        let state = self.reconcile(gateway, state, market_price).await;

        info!(
            buy = %state.netting.hedge_buy.deficit,
            sell = %state.netting.hedge_sell.deficit,
            "DEFICIT"
        );
        info!(
            buy = %state.netting.hedge_buy.surplus,
            sell = %state.netting.hedge_sell.surplus,
            "SURPLUS"
        );
        info!(
            buy = %state.netting.hedge_buy.total,
            sell = %state.netting.hedge_sell.total,
            "TOTAL"
        );

        state
    }

    /// One reconciliation pass.
    ///
    /// Read-heavy and idempotent: placement and cancellation are gated on
    /// slot emptiness, so a second pass with unchanged external state has no
    /// side effects. Gateway failures on one slot never abort the others.
    pub async fn reconcile<G: MarketGateway>(
        &self,
        gateway: &G,
        mut state: ReconciliationState,
        market_price: Decimal,
    ) -> ReconciliationState {
        if market_price <= Decimal::ZERO {
            error!(%market_price, "Non-positive market price, skipping tick");
            return state;
        }

        let own_orders = match gateway.get_own_orders(&self.market_id).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "Could not fetch own orders, skipping tick");
                return state;
            }
        };

        for order in &own_orders.bids {
            info!(
                amount = %order.offer_amount,
                price = %order.price,
                output_ref = %order.output_reference,
                identity = %order.identity,
                "Resting BID"
            );
        }
        for order in &own_orders.asks {
            info!(
                amount = %order.offer_amount,
                price = %order.price,
                output_ref = %order.output_reference,
                identity = %order.identity,
                "Resting ASK"
            );
        }

        let ask_ids: HashSet<&str> = own_orders.asks.iter().map(|o| o.identity.as_str()).collect();
        let bid_ids: HashSet<&str> = own_orders.bids.iter().map(|o| o.identity.as_str()).collect();

        // Bootstrap: nothing resting and nothing tracked.
        if ask_ids.is_empty()
            && bid_ids.is_empty()
            && state.actual_sell.is_empty()
            && state.actual_buy.is_empty()
        {
            self.place_actual(gateway, &mut state, Side::Buy, market_price)
                .await;
            self.place_actual(gateway, &mut state, Side::Sell, market_price)
                .await;
            return state;
        }

        // Fill detection: a tracked identity missing from the snapshot means
        // the order was taken. A filled hedge closes its cycle and only needs
        // its slot cleared; a filled actual is hedged with its counter-order.
        if let Some(identity) = state.hedge_sell.identity.clone() {
            if !ask_ids.contains(identity.as_str()) {
                info!(%identity, "HEDGE SELL no longer resting, cycle closed");
                state.hedge_sell.clear_identity();
            }
        }
        if let Some(identity) = state.hedge_buy.identity.clone() {
            if !bid_ids.contains(identity.as_str()) {
                info!(%identity, "HEDGE BUY no longer resting, cycle closed");
                state.hedge_buy.clear_identity();
            }
        }
        if let Some(identity) = state.actual_sell.identity.clone() {
            if !ask_ids.contains(identity.as_str()) {
                info!(%identity, "ACTUAL SELL no longer resting, placing hedge");
                state.actual_sell.clear_identity();
                self.place_hedge(gateway, &mut state, Side::Buy).await;
            }
        }
        if let Some(identity) = state.actual_buy.identity.clone() {
            if !bid_ids.contains(identity.as_str()) {
                info!(%identity, "ACTUAL BUY no longer resting, placing hedge");
                state.actual_buy.clear_identity();
                self.place_hedge(gateway, &mut state, Side::Sell).await;
            }
        }

        // Drift checks for every order still tracked and resting.
        for order in &own_orders.asks {
            if state.actual_sell.holds(&order.identity) {
                self.check_actual_drift(gateway, &mut state, Side::Sell, order, market_price)
                    .await;
            } else if state.hedge_sell.holds(&order.identity) {
                self.check_hedge_drift(gateway, &mut state, Side::Sell, order, market_price)
                    .await;
            }
        }
        for order in &own_orders.bids {
            if state.actual_buy.holds(&order.identity) {
                self.check_actual_drift(gateway, &mut state, Side::Buy, order, market_price)
                    .await;
            } else if state.hedge_buy.holds(&order.identity) {
                self.check_hedge_drift(gateway, &mut state, Side::Buy, order, market_price)
                    .await;
            }
        }

        state
    }

    /// Quote a new actual order around the market price, consuming any net
    /// carry left over from the paired hedge flow.
    async fn place_actual<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        side: Side,
        market_price: Decimal,
    ) {
        if !state.slot(OrderClass::Actual, side).is_empty() {
            // Emptiness gating should make this unreachable.
            error!(%side, "Internal error: ACTUAL slot already tracks an order");
            return;
        }

        info!("Processing new ACTUAL {side} order");
        let deviation = self.config.std * self.config.multiplier;

        match side {
            Side::Buy => {
                let price = market_price * (Decimal::ONE - deviation);
                let mut offer = floor_units(self.config.base_amount);

                // Net carry from the hedge-sell flow, converted into
                // base-asset units, consumed exactly once.
                if !state.netting.hedge_sell.total.is_zero() {
                    let total = state.netting.hedge_sell.consume_total();
                    let carry = (total * price).floor().abs();
                    info!(%carry, "Applying hedge-sell net carry to ACTUAL BUY size");
                    offer += carry;
                }

                let price_amount = floor_units(offer / price);
                state.netting.hedge_sell.surplus = price_amount;
                state.actual_buy.price = price;
                state.actual_buy.offer_amount = offer;

                info!(
                    market = %self.market_id,
                    amount = %price_amount,
                    %price,
                    "ACTUAL BUY order"
                );
                self.place(
                    gateway,
                    state,
                    OrderClass::Actual,
                    Side::Buy,
                    offer,
                    &self.config.base_asset,
                    &self.config.target_asset,
                    price_amount,
                )
                .await;
            }
            Side::Sell => {
                let price = market_price * (Decimal::ONE + deviation);
                let mut offer = floor_units(self.config.target_amount);

                // Net carry from the hedge-buy flow, converted into
                // target-asset units, consumed exactly once.
                if !state.netting.hedge_buy.total.is_zero() {
                    let total = state.netting.hedge_buy.consume_total();
                    let carry = (total / price).floor().abs();
                    info!(%carry, "Applying hedge-buy net carry to ACTUAL SELL size");
                    offer += carry;
                }

                let price_amount = floor_units(offer * price);
                state.netting.hedge_buy.surplus = price_amount;
                state.actual_sell.price = price;
                state.actual_sell.offer_amount = offer;

                info!(
                    market = %self.market_id,
                    amount = %price_amount,
                    %price,
                    "ACTUAL SELL order"
                );
                self.place(
                    gateway,
                    state,
                    OrderClass::Actual,
                    Side::Sell,
                    offer,
                    &self.config.target_asset,
                    &self.config.base_asset,
                    price_amount,
                )
                .await;
            }
        }
    }

    /// Place the counter-order for a filled actual order, priced off the
    /// actual quote with the configured spread.
    async fn place_hedge<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        side: Side,
    ) {
        if !state.slot(OrderClass::Hedge, side).is_empty() {
            // Emptiness gating should make this unreachable.
            error!(%side, "Internal error: HEDGE slot already tracks an order");
            return;
        }

        info!("Processing new HEDGE {side} order");

        match side {
            Side::Buy => {
                let price = state.actual_sell.price * (Decimal::ONE - self.config.spread);
                let offer = floor_units(state.actual_sell.offer_amount * price);
                state.netting.hedge_buy.surplus -= offer;

                let price_amount = state.actual_sell.offer_amount;
                state.hedge_buy.price = price;
                state.hedge_buy.offer_amount = offer;

                info!(
                    market = %self.market_id,
                    amount = %offer,
                    %price,
                    "HEDGE BUY order"
                );
                self.place(
                    gateway,
                    state,
                    OrderClass::Hedge,
                    Side::Buy,
                    offer,
                    &self.config.base_asset,
                    &self.config.target_asset,
                    price_amount,
                )
                .await;
            }
            Side::Sell => {
                let price = state.actual_buy.price * (Decimal::ONE + self.config.spread);
                let offer = floor_units(state.actual_buy.offer_amount / price);
                state.netting.hedge_sell.surplus -= offer;

                let price_amount = state.actual_buy.offer_amount;
                state.hedge_sell.price = price;
                state.hedge_sell.offer_amount = offer;

                info!(
                    market = %self.market_id,
                    amount = %offer,
                    %price,
                    "HEDGE SELL order"
                );
                self.place(
                    gateway,
                    state,
                    OrderClass::Hedge,
                    Side::Sell,
                    offer,
                    &self.config.target_asset,
                    &self.config.base_asset,
                    price_amount,
                )
                .await;
            }
        }
    }

    /// Submit one order and record its identity in the slot.
    ///
    /// A failed placement leaves the slot empty; the bootstrap or
    /// fill-detection path retries it on the next tick.
    #[allow(clippy::too_many_arguments)]
    async fn place<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        class: OrderClass,
        side: Side,
        offer_amount: Decimal,
        offer_token: &str,
        price_token: &str,
        price_amount: Decimal,
    ) {
        info!("Placing {class} {side} order");
        let params = PlaceOrder::new(offer_amount, offer_token, price_token, price_amount);
        match gateway.place_order(params).await {
            Ok(placed) => {
                state.slot_mut(class, side).identity = Some(placed.identity);
                info!(order_ref = %placed.order_ref, "Placed {class} {side} order");
            }
            Err(e) => {
                error!(
                    error = %e,
                    "Could not place {class} {side} order, retrying next tick"
                );
            }
        }
    }

    /// Drift check for a resting actual order.
    async fn check_actual_drift<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        side: Side,
        order: &OrderInfo,
        market_price: Decimal,
    ) {
        let quoted = state.slot(OrderClass::Actual, side).price;
        info!(identity = %order.identity, "ACTUAL {side} order open");

        if should_cancel(quoted, market_price, self.config.actual_cancel_threshold) {
            self.cancel(gateway, state, OrderClass::Actual, side, order)
                .await;
        } else {
            info!(identity = %order.identity, "No need to cancel ACTUAL {side} order");
        }
    }

    /// Drift check for a resting hedge order. On cancellation the unhedged
    /// amount is recorded as a deficit and the net carry is computed for the
    /// next actual order of the same flow.
    async fn check_hedge_drift<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        side: Side,
        order: &OrderInfo,
        market_price: Decimal,
    ) {
        let quoted = state.slot(OrderClass::Hedge, side).price;
        info!(identity = %order.identity, "HEDGE {side} order open");

        if !should_cancel(quoted, market_price, self.config.hedge_cancel_threshold) {
            info!(identity = %order.identity, "No need to cancel HEDGE {side} order");
            return;
        }

        // Buy deficits are converted into the carry currency via the hedge
        // price; sell deficits are already denominated in it.
        let (netting, deficit) = match side {
            Side::Buy => (
                &mut state.netting.hedge_buy,
                floor_units(order.offer_amount) * quoted,
            ),
            Side::Sell => (
                &mut state.netting.hedge_sell,
                floor_units(order.offer_amount),
            ),
        };
        netting.record_cancellation(deficit);
        info!(deficit = %netting.deficit, surplus = %netting.surplus, total = %netting.total, "Hedge {side} netting updated");

        self.cancel(gateway, state, OrderClass::Hedge, side, order)
            .await;
    }

    /// Cancel one resting order and clear its slot.
    ///
    /// A failed cancellation leaves the slot populated; the drift check
    /// retries it on the next tick.
    async fn cancel<G: MarketGateway>(
        &self,
        gateway: &G,
        state: &mut ReconciliationState,
        class: OrderClass,
        side: Side,
        order: &OrderInfo,
    ) {
        info!(
            identity = %order.identity,
            order_reference = %order.output_reference,
            "Cancelling {class} {side} order"
        );
        match gateway.cancel_order(&order.output_reference).await {
            Ok(()) => {
                state.slot_mut(class, side).clear_identity();
                info!(identity = %order.identity, "Cancelled {class} {side} order");
            }
            Err(e) => {
                error!(
                    error = %e,
                    "Could not cancel {class} {side} order, retrying next tick"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockGateway;
    use rust_decimal_macros::dec;

    fn config() -> StrategyConfig {
        StrategyConfig {
            base_asset: "lovelace".to_string(),
            target_asset: "tGENS".to_string(),
            base_amount: dec!(5_000_000),
            target_amount: dec!(10_000_000),
            order_level: 1,
            limit: 100,
            spread: dec!(0.01),
            multiplier: dec!(2),
            actual_cancel_threshold: dec!(0.05),
            hedge_cancel_threshold: dec!(0.05),
            std: dec!(0.02),
        }
    }

    fn gateway() -> MockGateway {
        MockGateway::new("lovelace_tGENS", "lovelace", "tGENS")
    }

    fn strategy() -> SingleOrderStrategy {
        SingleOrderStrategy::new(config()).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_places_both_actual_orders() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;

        let placements = gw.placements().await;
        assert_eq!(placements.len(), 2);

        // Actual buy: offers base at market * (1 - 0.02*2) = 1.44
        assert_eq!(placements[0].offer_amount, "5000000");
        assert_eq!(placements[0].offer_token, "lovelace");
        assert_eq!(placements[0].price_token, "tGENS");
        // floor(5_000_000 / 1.44)
        assert_eq!(placements[0].price_amount, "3472222");

        // Actual sell: offers target at market * (1 + 0.04) = 1.56
        assert_eq!(placements[1].offer_amount, "10000000");
        assert_eq!(placements[1].offer_token, "tGENS");
        // floor(10_000_000 * 1.56)
        assert_eq!(placements[1].price_amount, "15600000");

        assert_eq!(state.actual_buy.price, dec!(1.44));
        assert_eq!(state.actual_sell.price, dec!(1.56));
        assert!(!state.actual_buy.is_empty());
        assert!(!state.actual_sell.is_empty());
        assert_eq!(state.netting.hedge_sell.surplus, dec!(3472222));
        assert_eq!(state.netting.hedge_buy.surplus, dec!(15600000));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;
        let state = strat.reconcile(&gw, state, dec!(1.50)).await;
        let _ = strat.reconcile(&gw, state, dec!(1.50)).await;

        assert_eq!(gw.placements().await.len(), 2);
        assert!(gw.cancellations().await.is_empty());
    }

    #[tokio::test]
    async fn test_sell_fill_triggers_hedge_buy() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;
        let sold = state.actual_sell.identity.clone().unwrap();
        gw.remove_order(&sold).await;

        let state = strat.reconcile(&gw, state, dec!(1.50)).await;

        assert!(state.actual_sell.is_empty());
        assert!(!state.hedge_buy.is_empty());

        // Hedge buy priced off the actual sell quote: 1.56 * (1 - 0.01)
        assert_eq!(state.hedge_buy.price, dec!(1.5444));
        // floor(10_000_000 * 1.5444)
        assert_eq!(state.hedge_buy.offer_amount, dec!(15444000));

        let placements = gw.placements().await;
        assert_eq!(placements.len(), 3);
        assert_eq!(placements[2].offer_token, "lovelace");
        assert_eq!(placements[2].offer_amount, "15444000");
        assert_eq!(placements[2].price_amount, "10000000");

        // Surplus decremented by the hedged amount
        assert_eq!(state.netting.hedge_buy.surplus, dec!(156000));
    }

    #[tokio::test]
    async fn test_buy_fill_triggers_hedge_sell() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;
        let bought = state.actual_buy.identity.clone().unwrap();
        gw.remove_order(&bought).await;

        let state = strat.reconcile(&gw, state, dec!(1.50)).await;

        assert!(state.actual_buy.is_empty());
        assert!(!state.hedge_sell.is_empty());

        // Hedge sell priced off the actual buy quote: 1.44 * (1 + 0.01)
        assert_eq!(state.hedge_sell.price, dec!(1.4544));
        // floor(5_000_000 / 1.4544)
        assert_eq!(state.hedge_sell.offer_amount, dec!(3437843));

        let placements = gw.placements().await;
        assert_eq!(placements.len(), 3);
        assert_eq!(placements[2].offer_token, "tGENS");
        assert_eq!(placements[2].price_amount, "5000000");
    }

    #[tokio::test]
    async fn test_filled_hedge_clears_its_slot() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;
        let bought = state.actual_buy.identity.clone().unwrap();
        gw.remove_order(&bought).await;

        // The buy fill spawns a hedge sell; then that hedge fills too.
        let state = strat.reconcile(&gw, state, dec!(1.50)).await;
        let hedged = state.hedge_sell.identity.clone().unwrap();
        gw.remove_order(&hedged).await;

        let state = strat.reconcile(&gw, state, dec!(1.50)).await;

        // A filled hedge closes its cycle: slot cleared, no counter-order.
        assert!(state.hedge_sell.is_empty());
        assert_eq!(gw.placements().await.len(), 3);
        assert!(gw.cancellations().await.is_empty());
    }

    #[tokio::test]
    async fn test_hedging_resumes_after_a_hedge_fill() {
        let gw = gateway();
        let strat = strategy();

        // A tracked actual buy rests on the venue; the hedge sell from an
        // earlier cycle already filled, so its identity is gone from the book.
        let actual_bid = gw
            .place_order(PlaceOrder::new(
                dec!(5_000_000),
                "lovelace",
                "tGENS",
                dec!(3_472_222),
            ))
            .await
            .unwrap();

        let mut state = ReconciliationState::default();
        state.actual_buy.identity = Some(actual_bid.identity.clone());
        state.actual_buy.price = dec!(1.44);
        state.actual_buy.offer_amount = dec!(5_000_000);
        state.hedge_sell.identity = Some("nft-filled-hedge".to_string());
        state.hedge_sell.price = dec!(1.4544);
        state.hedge_sell.offer_amount = dec!(3_437_843);

        // The actual buy fills in the same snapshot.
        gw.remove_order(&actual_bid.identity).await;

        let state = strat.reconcile(&gw, state, dec!(1.50)).await;

        // The stale hedge slot must not block hedging the fresh fill.
        let placements = gw.placements().await;
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[1].offer_token, "tGENS");
        assert_eq!(placements[1].price_amount, "5000000");
        assert!(!state.hedge_sell.is_empty());
        assert_ne!(
            state.hedge_sell.identity.as_deref(),
            Some("nft-filled-hedge")
        );
        assert_eq!(state.hedge_sell.price, dec!(1.4544));
    }

    #[tokio::test]
    async fn test_non_positive_market_price_skips_tick() {
        let gw = gateway();
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), Decimal::ZERO)
            .await;

        assert!(gw.placements().await.is_empty());
        assert!(state.actual_buy.is_empty());
        assert!(state.actual_sell.is_empty());
    }

    #[tokio::test]
    async fn test_actual_drift_cancels_only_the_drifted_side() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;

        // 1.58 breaches the buy quote's band [1.368, 1.512] but stays
        // inside the sell quote's band [1.482, 1.638].
        let state = strat.reconcile(&gw, state, dec!(1.58)).await;

        assert_eq!(gw.cancellations().await.len(), 1);
        assert!(state.actual_buy.is_empty());
        assert!(!state.actual_sell.is_empty());
    }

    #[tokio::test]
    async fn test_hedge_sell_cancellation_records_deficit_and_carry() {
        let gw = gateway();
        let strat = strategy();

        // Seed the book: a tracked actual buy still within its band and a
        // hedge sell for 80 units (offering target, so it rests as an ask).
        let actual_bid = gw
            .place_order(PlaceOrder::new(dec!(100), "lovelace", "tGENS", dec!(50)))
            .await
            .unwrap();
        let hedge_ask = gw
            .place_order(PlaceOrder::new(dec!(80), "tGENS", "lovelace", dec!(80)))
            .await
            .unwrap();

        let mut state = ReconciliationState::default();
        state.actual_buy.identity = Some(actual_bid.identity);
        state.actual_buy.price = dec!(2.0);
        state.hedge_sell.identity = Some(hedge_ask.identity);
        state.hedge_sell.price = dec!(1.0);
        state.hedge_sell.offer_amount = dec!(80);
        state.netting.hedge_sell.surplus = dec!(120);

        // Market at 2.0 is far outside the hedge band around 1.0 but inside
        // the actual buy band around 2.0.
        let state = strat.reconcile(&gw, state, dec!(2.0)).await;

        assert_eq!(state.netting.hedge_sell.deficit, dec!(80));
        assert_eq!(state.netting.hedge_sell.total, dec!(40));
        assert!(state.hedge_sell.is_empty());
        assert!(!state.actual_buy.is_empty());
        assert_eq!(gw.cancellations().await, vec![hedge_ask.order_ref]);
    }

    #[tokio::test]
    async fn test_net_carry_consumed_by_next_actual_buy() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        // Carry of 40 target units left over from a hedge-sell cancellation.
        let mut state = ReconciliationState::default();
        state.netting.hedge_sell.surplus = dec!(120);
        state.netting.hedge_sell.record_cancellation(dec!(80));
        assert_eq!(state.netting.hedge_sell.total, dec!(40));

        let state = strat.reconcile(&gw, state, dec!(1.50)).await;

        // Actual buy size = base_amount + floor(40 * 1.44) = 5_000_057
        let placements = gw.placements().await;
        assert_eq!(placements[0].offer_amount, "5000057");

        // Carry consumed exactly once.
        assert_eq!(state.netting.hedge_sell.total, Decimal::ZERO);
        assert_eq!(state.netting.hedge_sell.deficit, Decimal::ZERO);
        // Surplus rebased on the new quote: floor(5_000_057 / 1.44)
        assert_eq!(state.netting.hedge_sell.surplus, dec!(3472261));
    }

    #[tokio::test]
    async fn test_hedge_buy_deficit_is_price_converted() {
        let gw = gateway();
        let strat = strategy();

        // Hedge buy offers base, so it rests as a bid of 100 units; the
        // tracked actual sell rests as an ask within its band.
        let hedge_bid = gw
            .place_order(PlaceOrder::new(dec!(100), "lovelace", "tGENS", dec!(200)))
            .await
            .unwrap();
        let actual_ask = gw
            .place_order(PlaceOrder::new(dec!(50), "tGENS", "lovelace", dec!(100)))
            .await
            .unwrap();

        let mut state = ReconciliationState::default();
        state.hedge_buy.identity = Some(hedge_bid.identity);
        state.hedge_buy.price = dec!(0.5);
        state.netting.hedge_buy.surplus = dec!(80);
        state.actual_sell.identity = Some(actual_ask.identity);
        state.actual_sell.price = dec!(2.0);

        let state = strat.reconcile(&gw, state, dec!(2.0)).await;

        // Buy-side deficit is converted by the hedge price: 100 * 0.5 = 50.
        assert_eq!(state.netting.hedge_buy.deficit, dec!(50.0));
        assert_eq!(state.netting.hedge_buy.total, dec!(30.0));
        assert!(state.hedge_buy.is_empty());
    }

    #[tokio::test]
    async fn test_failed_placement_leaves_slot_empty_for_retry() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        gw.set_fail_place(true).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;
        assert!(state.actual_buy.is_empty());
        assert!(state.actual_sell.is_empty());

        gw.set_fail_place(false).await;
        let state = strat.reconcile(&gw, state, dec!(1.50)).await;
        assert!(!state.actual_buy.is_empty());
        assert!(!state.actual_sell.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cancellation_keeps_slot_populated() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        let state = strat
            .reconcile(&gw, ReconciliationState::default(), dec!(1.50))
            .await;

        gw.set_fail_cancel(true).await;
        // 2.0 breaches both quote bands, but cancellations fail.
        let state = strat.reconcile(&gw, state, dec!(2.0)).await;
        assert!(!state.actual_buy.is_empty());
        assert!(!state.actual_sell.is_empty());

        gw.set_fail_cancel(false).await;
        let state = strat.reconcile(&gw, state, dec!(2.0)).await;
        assert!(state.actual_buy.is_empty());
        assert!(state.actual_sell.is_empty());
        assert_eq!(gw.cancellations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_first_execute_sweeps_existing_orders() {
        let gw = gateway();
        gw.set_price(dec!(1.50)).await;
        let strat = strategy();

        // Orders left on the venue by a previous run.
        gw.place_order(PlaceOrder::new(dec!(100), "lovelace", "tGENS", dec!(70)))
            .await
            .unwrap();
        gw.place_order(PlaceOrder::new(dec!(50), "tGENS", "lovelace", dec!(75)))
            .await
            .unwrap();

        let state = strat
            .execute(&gw, ReconciliationState::default(), dec!(1.50))
            .await;

        assert!(state.swept);
        assert_eq!(gw.cancellations().await.len(), 2);
        // After the sweep the book is empty, so the bootstrap quotes both sides.
        assert!(!state.actual_buy.is_empty());
        assert!(!state.actual_sell.is_empty());
    }
}

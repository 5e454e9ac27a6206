//! Scripted in-memory gateway for strategy tests.

use crate::exchange::traits::MarketGateway;
use crate::exchange::types::*;
use crate::utils::decimal::safe_div;
use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mutable venue state behind the mock.
#[derive(Debug, Default)]
struct MockVenueState {
    price: Decimal,
    asks: Vec<OrderInfo>,
    bids: Vec<OrderInfo>,
    balances: HashMap<String, Decimal>,
    /// Every placement the strategy submitted, in order
    placements: Vec<PlaceOrder>,
    /// Every cancelled order reference, in order
    cancellations: Vec<String>,
    fail_place: bool,
    fail_cancel: bool,
}

/// In-memory gateway that simulates the DEX backend.
///
/// Placed orders are appended to the scripted book (bids when the offered
/// token is the base asset, asks otherwise) and minted sequential
/// identities. Fills are simulated by removing an order from the book.
pub struct MockGateway {
    market: Market,
    state: Arc<RwLock<MockVenueState>>,
    order_counter: AtomicU64,
}

impl MockGateway {
    pub fn new(market_id: &str, base_asset: &str, target_asset: &str) -> Self {
        Self {
            market: Market {
                market_id: market_id.to_string(),
                base_asset: base_asset.to_string(),
                target_asset: target_asset.to_string(),
            },
            state: Arc::new(RwLock::new(MockVenueState::default())),
            order_counter: AtomicU64::new(1),
        }
    }

    /// Set the latest closing price served by `get_market_price`.
    pub async fn set_price(&self, price: Decimal) {
        self.state.write().await.price = price;
    }

    /// Set available balances for the bot's address.
    pub async fn set_balances(&self, balances: HashMap<String, Decimal>) {
        self.state.write().await.balances = balances;
    }

    /// Simulate a fill: the order disappears from the own-orders snapshot.
    pub async fn remove_order(&self, identity: &str) {
        let mut state = self.state.write().await;
        state.asks.retain(|o| o.identity != identity);
        state.bids.retain(|o| o.identity != identity);
    }

    /// Make subsequent placements fail with a transport error.
    pub async fn set_fail_place(&self, fail: bool) {
        self.state.write().await.fail_place = fail;
    }

    /// Make subsequent cancellations fail with a transport error.
    pub async fn set_fail_cancel(&self, fail: bool) {
        self.state.write().await.fail_cancel = fail;
    }

    /// All placements submitted so far.
    pub async fn placements(&self) -> Vec<PlaceOrder> {
        self.state.read().await.placements.clone()
    }

    /// All cancelled order references so far.
    pub async fn cancellations(&self) -> Vec<String> {
        self.state.read().await.cancellations.clone()
    }

    /// Current own-orders snapshot.
    pub async fn book(&self) -> OwnOrders {
        let state = self.state.read().await;
        OwnOrders {
            asks: state.asks.clone(),
            bids: state.bids.clone(),
        }
    }
}

#[async_trait]
impl MarketGateway for MockGateway {
    async fn get_markets(&self) -> Result<Vec<Market>> {
        Ok(vec![self.market.clone()])
    }

    async fn get_market_price(&self, _market_id: &str) -> Result<Decimal> {
        Ok(self.state.read().await.price)
    }

    async fn get_own_orders(&self, _market_id: &str) -> Result<OwnOrders> {
        Ok(self.book().await)
    }

    async fn place_order(&self, params: PlaceOrder) -> Result<PlacedOrder> {
        let mut state = self.state.write().await;
        if state.fail_place {
            bail!("mock gateway: placement rejected");
        }

        let seq = self.order_counter.fetch_add(1, Ordering::SeqCst);
        let placed = PlacedOrder {
            order_ref: format!("mock-tx#{}", seq),
            identity: format!("mock-nft-{}", seq),
        };

        let offer_amount: Decimal = params.offer_amount.parse()?;
        let price_amount: Decimal = params.price_amount.parse()?;
        let info = OrderInfo {
            identity: placed.identity.clone(),
            output_reference: placed.order_ref.clone(),
            offer_amount,
            price: safe_div(price_amount, offer_amount),
        };

        if params.offer_token == self.market.base_asset {
            state.bids.push(info);
        } else {
            state.asks.push(info);
        }
        state.placements.push(params);

        Ok(placed)
    }

    async fn cancel_order(&self, order_reference: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_cancel {
            bail!("mock gateway: cancellation rejected");
        }

        state.asks.retain(|o| o.output_reference != order_reference);
        state.bids.retain(|o| o.output_reference != order_reference);
        state.cancellations.push(order_reference.to_string());

        Ok(())
    }

    async fn get_balances(&self) -> Result<HashMap<String, Decimal>> {
        Ok(self.state.read().await.balances.clone())
    }
}

//! Type definitions for DEX backend API responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Backend settings, reported once at connection time.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub version: String,
    pub backend: String,
    #[serde(default)]
    pub revision: Option<String>,
    /// Address owning the orders this bot manages
    pub address: String,
}

/// A tradable market on the venue.
#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub market_id: String,
    pub base_asset: String,
    pub target_asset: String,
}

/// One resting order as reported by the venue's order-book query.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInfo {
    /// Opaque on-chain token identifying this order
    #[serde(rename = "nft_token")]
    pub identity: String,
    /// UTxO reference used to cancel the order
    pub output_reference: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub offer_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// The caller's resting orders on one market.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnOrders {
    #[serde(default)]
    pub asks: Vec<OrderInfo>,
    #[serde(default)]
    pub bids: Vec<OrderInfo>,
}

/// One OHLC candle from the historical-prices endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Ohlc {
    #[serde(with = "rust_decimal::serde::str")]
    pub base_close: Decimal,
}

/// Parameters for a limit-order placement.
///
/// Amounts are whole smallest-tradable units; the wire format carries them
/// as integer strings.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrder {
    pub offer_amount: String,
    pub offer_token: String,
    pub price_token: String,
    pub price_amount: String,
}

impl PlaceOrder {
    pub fn new(
        offer_amount: Decimal,
        offer_token: &str,
        price_token: &str,
        price_amount: Decimal,
    ) -> Self {
        Self {
            offer_amount: offer_amount.trunc().to_string(),
            offer_token: offer_token.to_string(),
            price_token: price_token.to_string(),
            price_amount: price_amount.trunc().to_string(),
        }
    }
}

/// Response to a successful order placement.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedOrder {
    pub order_ref: String,
    #[serde(rename = "nft_token")]
    pub identity: String,
}

/// Body of an order-cancellation request.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOrder {
    pub address: String,
    pub order_references: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_own_orders_parses_wire_amounts() {
        let json = r#"{
            "asks": [{
                "nft_token": "a1b2",
                "output_reference": "tx#0",
                "offer_amount": "1000000",
                "price": "1.44"
            }],
            "bids": []
        }"#;
        let orders: OwnOrders = serde_json::from_str(json).unwrap();
        assert_eq!(orders.asks.len(), 1);
        assert_eq!(orders.asks[0].identity, "a1b2");
        assert_eq!(orders.asks[0].offer_amount, dec!(1000000));
        assert_eq!(orders.asks[0].price, dec!(1.44));
        assert!(orders.bids.is_empty());
    }

    #[test]
    fn test_place_order_truncates_to_integer_strings() {
        let params = PlaceOrder::new(dec!(333.7), "lovelace", "tGENS", dec!(231.9));
        assert_eq!(params.offer_amount, "333");
        assert_eq!(params.price_amount, "231");
    }
}

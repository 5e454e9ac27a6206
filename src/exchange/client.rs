//! DEX backend REST API client.

use crate::config::{BackendConfig, ScheduleConfig};
use crate::exchange::traits::MarketGateway;
use crate::exchange::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// DEX selected as the price source for historical candles.
const PRICE_DEX: &str = "minswap";

/// Typed error for non-success backend responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// REST client for the DEX order backend.
///
/// Authenticates with a static `api-key` header. After each placement or
/// cancellation the client pauses for the configured confirmation delay so
/// that on-chain state has settled before the next query.
pub struct DexClient {
    http: Client,
    base_url: String,
    api_key: String,
    own_address: String,
    order_limit: Option<u32>,
    confirmation_delay: Duration,
}

impl DexClient {
    /// Create a new client from configuration.
    pub fn new(config: &BackendConfig, schedule: &ScheduleConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            own_address: String::new(),
            order_limit: None,
            confirmation_delay: Duration::from_secs(schedule.confirmation_delay_secs),
        })
    }

    /// Bind the client to the backend's own address (from `get_settings`).
    ///
    /// Own-order queries and cancellations are scoped to this address.
    pub fn with_own_address(mut self, address: String) -> Self {
        self.own_address = address;
        self
    }

    /// Cap the number of own-order rows requested per order-book query.
    pub fn with_order_limit(mut self, limit: u32) -> Self {
        self.order_limit = Some(limit);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v0/{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status { status, body }.into())
    }

    /// Backend settings: version, backend kind, and the bot's own address.
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<Settings> {
        let response = self
            .http
            .get(self.url("settings"))
            .header("api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch backend settings")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse settings response")
    }
}

#[async_trait]
impl MarketGateway for DexClient {
    #[instrument(skip(self))]
    async fn get_markets(&self) -> Result<Vec<Market>> {
        let response = self
            .http
            .get(self.url("markets"))
            .header("api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch markets")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse markets response")
    }

    #[instrument(skip(self))]
    async fn get_market_price(&self, market_id: &str) -> Result<Decimal> {
        let url = self.url(&format!(
            "historical-prices/maestro/{}/{}",
            market_id, PRICE_DEX
        ));
        let response = self
            .http
            .get(&url)
            .query(&[("resolution", "1m"), ("sort", "desc"), ("limit", "1")])
            .header("api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch market price")?;

        let candles: Vec<Ohlc> = Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse market price response")?;

        let latest = candles
            .first()
            .context("No market price available for market")?;
        Ok(latest.base_close)
    }

    #[instrument(skip(self))]
    async fn get_own_orders(&self, market_id: &str) -> Result<OwnOrders> {
        let url = self.url(&format!("order-books/{}", market_id));
        let mut request = self
            .http
            .get(&url)
            .query(&[("address", self.own_address.as_str())]);
        if let Some(limit) = self.order_limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request
            .header("api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch own orders")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse own orders response")
    }

    #[instrument(skip(self, params))]
    async fn place_order(&self, params: PlaceOrder) -> Result<PlacedOrder> {
        debug!(
            offer_amount = %params.offer_amount,
            offer_token = %params.offer_token,
            price_token = %params.price_token,
            price_amount = %params.price_amount,
            "Submitting order"
        );

        let response = self
            .http
            .post(self.url("orders"))
            .header("api-key", &self.api_key)
            .json(&params)
            .send()
            .await
            .context("Failed to submit order")?;

        let placed: PlacedOrder = Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse place-order response")?;

        info!(
            order_ref = %placed.order_ref,
            "Order submitted, waiting {}s for confirmation",
            self.confirmation_delay.as_secs()
        );
        tokio::time::sleep(self.confirmation_delay).await;

        Ok(placed)
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, order_reference: &str) -> Result<()> {
        let body = CancelOrder {
            address: self.own_address.clone(),
            order_references: vec![order_reference.to_string()],
        };

        let response = self
            .http
            .delete(self.url("orders"))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to submit cancellation")?;

        Self::check(response).await?;

        info!(
            order_reference,
            "Cancellation submitted, waiting {}s for confirmation",
            self.confirmation_delay.as_secs()
        );
        tokio::time::sleep(self.confirmation_delay).await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_balances(&self) -> Result<HashMap<String, Decimal>> {
        let url = self.url(&format!("balances/{}", self.own_address));
        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch balances")?;

        let raw: HashMap<String, String> = Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse balances response")?;

        raw.into_iter()
            .map(|(asset, amount)| {
                let amount = amount
                    .parse()
                    .with_context(|| format!("Invalid balance amount for {}", asset))?;
                Ok((asset, amount))
            })
            .collect()
    }
}

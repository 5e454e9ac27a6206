//! Configuration management for the hedge maker.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// DEX backend connection settings
    pub backend: BackendConfig,
    /// Host-loop scheduling parameters
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Which strategy variant to run
    #[serde(default)]
    pub strategy_kind: StrategyKind,
    /// Strategy parameters (all required)
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the DEX REST backend
    pub url: String,
    /// API key sent as the `api-key` header
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds to wait before the first backend probe
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
    /// Seconds between backend probe retries
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    /// Seconds between strategy ticks
    #[serde(default = "default_execution_delay")]
    pub execution_delay_secs: u64,
    /// Seconds to pause after a placement or cancellation so that
    /// on-chain state has settled before the next call
    #[serde(default = "default_confirmation_delay")]
    pub confirmation_delay_secs: u64,
}

/// Strategy parameters.
///
/// Every field is required at construction; absence or an out-of-range
/// value is a fatal configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Base asset of the traded market
    pub base_asset: String,
    /// Target asset of the traded market
    pub target_asset: String,
    /// Offered amount for actual BUY orders, in smallest base-asset units
    pub base_amount: Decimal,
    /// Offered amount for actual SELL orders, in smallest target-asset units
    pub target_amount: Decimal,
    /// Number of order levels tracked per side
    pub order_level: u32,
    /// Maximum own-order rows requested from the backend per query
    pub limit: u32,
    /// Fractional spread between an actual price and its paired hedge price
    pub spread: Decimal,
    /// Scaling applied to the volatility estimate when quoting actual orders
    pub multiplier: Decimal,
    /// Fractional drift tolerance before an actual order is cancelled
    pub actual_cancel_threshold: Decimal,
    /// Fractional drift tolerance before a hedge order is cancelled
    pub hedge_cancel_threshold: Decimal,
    /// Fractional volatility estimate (standard deviation of returns)
    pub std: Decimal,
}

fn default_startup_delay() -> u64 {
    10
}

fn default_retry_delay() -> u64 {
    15
}

fn default_execution_delay() -> u64 {
    60
}

fn default_confirmation_delay() -> u64 {
    90
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: default_startup_delay(),
            retry_delay_secs: default_retry_delay(),
            execution_delay_secs: default_execution_delay(),
            confirmation_delay_secs: default_confirmation_delay(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from a named config file plus the environment.
    pub fn load_from(file: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::default().separator("__").prefix("DHM"))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.validate()?;
        Ok(app)
    }

    /// Validate configuration values. Errors here abort startup.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.backend.url.is_empty(), "backend.url must be set");
        self.strategy.validate()
    }
}

impl StrategyConfig {
    /// Canonical market identifier for the configured asset pair.
    pub fn market_id(&self) -> String {
        format!("{}_{}", self.base_asset, self.target_asset)
    }

    /// Range-check all strategy parameters.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.base_asset.is_empty(), "base_asset must be set");
        anyhow::ensure!(!self.target_asset.is_empty(), "target_asset must be set");
        anyhow::ensure!(
            self.base_asset != self.target_asset,
            "base_asset and target_asset must differ"
        );

        anyhow::ensure!(
            self.base_amount > Decimal::ZERO,
            "base_amount must be positive"
        );
        anyhow::ensure!(
            self.target_amount > Decimal::ZERO,
            "target_amount must be positive"
        );

        anyhow::ensure!(self.order_level >= 1, "order_level must be >= 1");
        anyhow::ensure!(self.limit >= 1, "limit must be >= 1");

        anyhow::ensure!(
            self.spread >= Decimal::ZERO && self.spread < Decimal::ONE,
            "spread must be in [0, 1)"
        );
        anyhow::ensure!(
            self.multiplier > Decimal::ZERO,
            "multiplier must be positive"
        );
        anyhow::ensure!(self.std >= Decimal::ZERO, "std must be non-negative");
        // std * multiplier >= 1 would zero or negate the actual buy quote.
        anyhow::ensure!(
            self.std * self.multiplier < Decimal::ONE,
            "std * multiplier must be below 1"
        );

        anyhow::ensure!(
            self.actual_cancel_threshold > Decimal::ZERO
                && self.actual_cancel_threshold < Decimal::ONE,
            "actual_cancel_threshold must be in (0, 1)"
        );
        anyhow::ensure!(
            self.hedge_cancel_threshold > Decimal::ZERO
                && self.hedge_cancel_threshold < Decimal::ONE,
            "hedge_cancel_threshold must be in (0, 1)"
        );

        Ok(())
    }
}

//! # DEX Hedge Maker
//!
//! A market-making bot that quotes paired actual/hedge limit orders on a
//! DEX REST backend and reconciles them once per polling tick.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: DEX backend REST client and the `MarketGateway` boundary
//! - `strategy`: Reconciliation loop, order ledger, and netting accountant
//! - `utils`: Shared decimal arithmetic helpers

pub mod config;
pub mod exchange;
pub mod strategy;
pub mod utils;

pub use config::AppConfig;

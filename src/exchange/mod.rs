//! DEX backend integration.
//!
//! Provides the REST client for the order backend together with the
//! `MarketGateway` trait the strategy layer is written against, plus a
//! scripted in-memory gateway for tests.

mod client;
pub mod mock;
mod traits;
mod types;

pub use client::{DexClient, GatewayError};
pub use mock::MockGateway;
pub use traits::MarketGateway;
pub use types::*;

//! Order ledger and netting ledger carried across reconciliation ticks.

use rust_decimal::Decimal;
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order class: primary quote or inventory-neutralizing counter-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderClass {
    Actual,
    Hedge,
}

impl fmt::Display for OrderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderClass::Actual => write!(f, "ACTUAL"),
            OrderClass::Hedge => write!(f, "HEDGE"),
        }
    }
}

/// One of the four tracked order positions.
///
/// `identity` is non-null iff the order is believed to be resting on-chain.
/// `price` and `offer_amount` survive the identity being cleared: the paired
/// hedge order is quoted from the actual order's last price and size.
#[derive(Debug, Clone, Default)]
pub struct OrderSlot {
    pub identity: Option<String>,
    pub price: Decimal,
    pub offer_amount: Decimal,
}

impl OrderSlot {
    /// True when no order is tracked in this slot.
    pub fn is_empty(&self) -> bool {
        self.identity.is_none()
    }

    /// Does this slot track the given on-chain identity?
    pub fn holds(&self, identity: &str) -> bool {
        self.identity.as_deref() == Some(identity)
    }

    /// Forget the tracked identity, keeping the quoted price and amount.
    pub fn clear_identity(&mut self) {
        self.identity = None;
    }
}

/// Deficit/surplus/total for one hedge side.
///
/// `surplus` accumulates the quantity an actual fill would hedge, `deficit`
/// the quantity a cancelled hedge order failed to cover, and
/// `total = surplus - deficit` is the net carry consumed by the next
/// same-side actual order.
#[derive(Debug, Clone, Default)]
pub struct NettingSide {
    pub deficit: Decimal,
    pub surplus: Decimal,
    pub total: Decimal,
}

impl NettingSide {
    /// Record the unhedged amount of a cancelled hedge order and compute
    /// the net carry. Called exactly once per cancellation event.
    pub fn record_cancellation(&mut self, deficit: Decimal) {
        self.deficit = deficit;
        self.total = self.surplus - self.deficit;
    }

    /// Take the net carry for consumption, zeroing deficit and total.
    pub fn consume_total(&mut self) -> Decimal {
        let total = self.total;
        self.total = Decimal::ZERO;
        self.deficit = Decimal::ZERO;
        total
    }
}

/// Netting ledger, one side per hedge flow.
#[derive(Debug, Clone, Default)]
pub struct NettingLedger {
    pub hedge_buy: NettingSide,
    pub hedge_sell: NettingSide,
}

/// Full reconciliation state threaded through each tick.
///
/// Owned by the caller and mutated only by the reconciliation loop; there is
/// no concurrent writer.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationState {
    pub actual_buy: OrderSlot,
    pub actual_sell: OrderSlot,
    pub hedge_buy: OrderSlot,
    pub hedge_sell: OrderSlot,
    pub netting: NettingLedger,
    /// Whether the startup sweep of pre-existing venue orders has run
    pub swept: bool,
}

impl ReconciliationState {
    pub fn slot(&self, class: OrderClass, side: Side) -> &OrderSlot {
        match (class, side) {
            (OrderClass::Actual, Side::Buy) => &self.actual_buy,
            (OrderClass::Actual, Side::Sell) => &self.actual_sell,
            (OrderClass::Hedge, Side::Buy) => &self.hedge_buy,
            (OrderClass::Hedge, Side::Sell) => &self.hedge_sell,
        }
    }

    pub fn slot_mut(&mut self, class: OrderClass, side: Side) -> &mut OrderSlot {
        match (class, side) {
            (OrderClass::Actual, Side::Buy) => &mut self.actual_buy,
            (OrderClass::Actual, Side::Sell) => &mut self.actual_sell,
            (OrderClass::Hedge, Side::Buy) => &mut self.hedge_buy,
            (OrderClass::Hedge, Side::Sell) => &mut self.hedge_sell,
        }
    }
}

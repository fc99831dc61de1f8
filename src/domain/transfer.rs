//! Token transfer events observed for a wallet.

use crate::domain::{Decimal, Direction, TimeSec};
use serde::{Deserialize, Serialize};

/// One observed token movement for a wallet/token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    /// Inbound (buy) or outbound (sell).
    pub direction: Direction,
    /// Token quantity, already normalized by the token's decimals.
    pub token_amount: Decimal,
    /// Block time of the transfer.
    pub timestamp: TimeSec,
}

impl TransferEvent {
    pub fn new(direction: Direction, token_amount: Decimal, timestamp: TimeSec) -> Self {
        Self {
            direction,
            token_amount,
            timestamp,
        }
    }

    /// Build an event from the provider's raw integer amount and the token's decimals.
    pub fn from_raw(
        direction: Direction,
        raw_amount: u128,
        decimals: u32,
        timestamp: TimeSec,
    ) -> Result<Self, rust_decimal::Error> {
        let token_amount = Decimal::from_raw_units(raw_amount, decimals)?;
        Ok(Self::new(direction, token_amount, timestamp))
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::In
    }
}

/// Sort transfers by timestamp, keeping provider order for equal timestamps.
pub fn sort_transfers_chronological(events: &mut [TransferEvent]) {
    events.sort_by_key(|e| e.timestamp);
}

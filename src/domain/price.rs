//! Price / market-cap samples returned by the oracle.

use crate::domain::{Decimal, TimeSec};
use serde::{Deserialize, Serialize};

/// A price and market-cap observation for a token.
///
/// An oracle miss is modeled as `Option::None`, never as a zeroed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    /// USD price per token unit.
    pub price: Decimal,
    /// USD market capitalization.
    pub market_cap: Decimal,
}

impl PriceSample {
    pub fn new(price: Decimal, market_cap: Decimal) -> Self {
        Self { price, market_cap }
    }
}

/// Which sample a lookup asks for: a historical point or the live value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "timestamp")]
pub enum PriceQuery {
    At(TimeSec),
    Current,
}

impl PriceQuery {
    /// The timestamp to pass to the oracle (`None` for the live value).
    pub fn timestamp(&self) -> Option<TimeSec> {
        match self {
            PriceQuery::At(t) => Some(*t),
            PriceQuery::Current => None,
        }
    }
}

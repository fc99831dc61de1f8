//! FIFO lot matching of transfer events into a net cost basis.
//!
//! Reconstruction runs in two phases so that async callers can fetch prices
//! between them: [`LotPlan::build`] matches sells against buys and reports the
//! [`PriceQuery`]s it needs, [`LotPlan::price`] turns the plan into a
//! [`WalletPosition`] using a synchronous lookup.

use crate::domain::{Decimal, PriceQuery, PriceSample, TimeSec, TransferEvent, WalletPosition};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, warn};

use super::EngineError;

/// How a sell that predates a buy is treated during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingMode {
    /// Sells at or before a buy's timestamp are retired and never offset that buy.
    #[default]
    Causal,
    /// Like `Causal`, except a sell that already offset an earlier buy keeps
    /// offsetting later buys until exhausted.
    CarryForward,
}

impl FromStr for MatchingMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "causal" => Ok(MatchingMode::Causal),
            "carry_forward" | "carryforward" => Ok(MatchingMode::CarryForward),
            _ => Err(()),
        }
    }
}

/// Unsold remainder of one buy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualLot {
    pub timestamp: TimeSec,
    pub quantity: Decimal,
}

#[derive(Debug)]
struct OpenSell {
    timestamp: TimeSec,
    remaining: Decimal,
    matched: bool,
}

impl OpenSell {
    fn retired_before(&self, buy_ts: TimeSec, mode: MatchingMode) -> bool {
        if self.timestamp > buy_ts {
            return false;
        }
        !(mode == MatchingMode::CarryForward && self.matched)
    }
}

/// Result of FIFO matching, before any price lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotPlan {
    residual_lots: Vec<ResidualLot>,
    net_tokens_held: Decimal,
    first_buy: TimeSec,
    last_sell: Option<TimeSec>,
}

impl LotPlan {
    /// Match sells against buys oldest-first.
    ///
    /// Events may arrive in any order; buys and sells are each stably sorted by
    /// timestamp. Fails with [`EngineError::NoBuyActivity`] when no event is inbound.
    pub fn build(events: &[TransferEvent], mode: MatchingMode) -> Result<Self, EngineError> {
        let mut buys: Vec<&TransferEvent> = events.iter().filter(|e| e.is_inbound()).collect();
        if buys.is_empty() {
            return Err(EngineError::NoBuyActivity);
        }
        buys.sort_by_key(|e| e.timestamp);

        let mut sells: Vec<OpenSell> = events
            .iter()
            .filter(|e| !e.is_inbound())
            .map(|e| OpenSell {
                timestamp: e.timestamp,
                remaining: e.token_amount,
                matched: false,
            })
            .collect();
        sells.sort_by_key(|s| s.timestamp);

        let first_buy = buys[0].timestamp;
        let last_sell = sells.last().map(|s| s.timestamp);

        let mut cursor = 0;
        let mut residual_lots = Vec::new();
        let mut net_tokens_held = Decimal::zero();

        for buy in &buys {
            let mut remaining = buy.token_amount;
            loop {
                while cursor < sells.len() && sells[cursor].retired_before(buy.timestamp, mode) {
                    cursor += 1;
                }
                if !remaining.is_positive() || cursor >= sells.len() {
                    break;
                }

                let sell = &mut sells[cursor];
                let consumed = remaining.min(sell.remaining);
                remaining -= consumed;
                sell.remaining -= consumed;
                sell.matched = true;
                if !sell.remaining.is_positive() {
                    cursor += 1;
                }
            }

            if remaining.is_positive() {
                net_tokens_held = net_tokens_held
                    .checked_add(remaining)
                    .ok_or(EngineError::PositionOverflow)?;
                residual_lots.push(ResidualLot {
                    timestamp: buy.timestamp,
                    quantity: remaining,
                });
            }
        }

        Ok(Self {
            residual_lots,
            net_tokens_held,
            first_buy,
            last_sell,
        })
    }

    pub fn residual_lots(&self) -> &[ResidualLot] {
        &self.residual_lots
    }

    pub fn entry_query(&self) -> PriceQuery {
        PriceQuery::At(self.first_buy)
    }

    /// Last sell if any, otherwise the live value.
    pub fn exit_query(&self) -> PriceQuery {
        self.last_sell.map(PriceQuery::At).unwrap_or(PriceQuery::Current)
    }

    /// Every distinct lookup [`LotPlan::price`] will make.
    pub fn price_queries(&self) -> BTreeSet<PriceQuery> {
        let mut queries: BTreeSet<PriceQuery> = self
            .residual_lots
            .iter()
            .map(|lot| PriceQuery::At(lot.timestamp))
            .collect();
        queries.insert(self.entry_query());
        queries.insert(self.exit_query());
        queries
    }

    /// Value the residual lots and resolve entry/exit market caps.
    ///
    /// A residual lot whose price is missing is valued at 0 and counted in
    /// `unpriced_lots`; missing market caps fall back to `fallback_market_cap`.
    pub fn price<F>(
        &self,
        price_at: F,
        fallback_market_cap: Decimal,
    ) -> Result<WalletPosition, EngineError>
    where
        F: Fn(PriceQuery) -> Option<PriceSample>,
    {
        let mut net_invested_usd = Decimal::zero();
        let mut unpriced_lots = 0;

        for lot in &self.residual_lots {
            match price_at(PriceQuery::At(lot.timestamp)) {
                Some(sample) => {
                    net_invested_usd = lot
                        .quantity
                        .checked_mul(sample.price)
                        .and_then(|value| net_invested_usd.checked_add(value))
                        .ok_or(EngineError::PositionOverflow)?;
                }
                None => {
                    unpriced_lots += 1;
                    warn!(
                        timestamp = %lot.timestamp,
                        quantity = %lot.quantity,
                        "No historical price for residual lot, valuing at 0"
                    );
                }
            }
        }

        let entry_market_cap = price_at(self.entry_query())
            .map(|s| s.market_cap)
            .unwrap_or(fallback_market_cap);
        let exit_market_cap = price_at(self.exit_query())
            .map(|s| s.market_cap)
            .unwrap_or(fallback_market_cap);

        debug!(
            net_tokens_held = %self.net_tokens_held,
            net_invested_usd = %net_invested_usd,
            residual_lots = self.residual_lots.len(),
            "Reconstructed position"
        );

        Ok(WalletPosition {
            net_invested_usd,
            entry_market_cap,
            exit_market_cap,
            unpriced_lots,
        })
    }
}

/// Reconstruct a position with [`MatchingMode::Causal`] matching.
///
/// For buys of 100 @ t=0 and 50 @ t=10 with a sell of 120 @ t=5 this holds 50
/// units, since the sell is retired before the second buy. Use
/// [`reconstruct_with_mode`] with [`MatchingMode::CarryForward`] for the
/// reading that carries the sell's remaining 20 into the second buy (30 held).
pub fn reconstruct<F>(
    events: &[TransferEvent],
    price_at: F,
    fallback_market_cap: Decimal,
) -> Result<WalletPosition, EngineError>
where
    F: Fn(PriceQuery) -> Option<PriceSample>,
{
    reconstruct_with_mode(events, MatchingMode::Causal, price_at, fallback_market_cap)
}

pub fn reconstruct_with_mode<F>(
    events: &[TransferEvent],
    mode: MatchingMode,
    price_at: F,
    fallback_market_cap: Decimal,
) -> Result<WalletPosition, EngineError>
where
    F: Fn(PriceQuery) -> Option<PriceSample>,
{
    LotPlan::build(events, mode)?.price(price_at, fallback_market_cap)
}

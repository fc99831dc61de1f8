//! Pure computation engines: position reconstruction, PnL and redistribution.
//!
//! Nothing in here performs I/O or keeps state between calls.

use crate::domain::Decimal;
use thiserror::Error;

pub mod pnl;
pub mod reconstruct;
pub mod redistribution;

pub use pnl::compute_pnl;
pub use reconstruct::{reconstruct, reconstruct_with_mode, LotPlan, MatchingMode, ResidualLot};
pub use redistribution::{redistribute, GroupSummary};

/// Per-wallet failures of the reconstruction and PnL engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No inbound transfer exists, so there is no cost basis.
    #[error("no buy activity: wallet has no inbound transfers")]
    NoBuyActivity,
    /// `entry_market_cap` is zero.
    #[error("division by zero: entry market cap is 0 for wallet {wallet_id}")]
    DivisionByZero { wallet_id: String },
    /// A record field is outside its valid range.
    #[error("invalid {field} for wallet {wallet_id}: {value}")]
    InvalidRecord {
        wallet_id: String,
        field: &'static str,
        value: Decimal,
    },
    #[error("arithmetic overflow computing PnL for wallet {wallet_id}")]
    Overflow { wallet_id: String },
    /// Group totals or transfer amounts exceed the decimal range.
    #[error("arithmetic overflow redistributing group")]
    GroupOverflow,
    /// Cost basis of the residual lots exceeds the decimal range.
    #[error("arithmetic overflow valuing position")]
    PositionOverflow,
}

//! Domain types for wallet position reconstruction and PnL redistribution.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeSec, Address, TokenId, Direction
//! - Transfer events and oracle price samples
//! - Wallet records, PnL results and redistribution policies

pub mod decimal;
pub mod policy;
pub mod price;
pub mod primitives;
pub mod transfer;
pub mod wallet;

pub use decimal::Decimal;
pub use policy::RedistributionPolicy;
pub use price::{PriceQuery, PriceSample};
pub use primitives::{Address, AddressParseError, Direction, TimeSec, TokenId};
pub use transfer::{sort_transfers_chronological, TransferEvent};
pub use wallet::{new_wallet_id, CalculatedWallet, PnlResult, WalletPnl, WalletPosition, WalletRecord};

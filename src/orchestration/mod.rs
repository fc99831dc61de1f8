pub mod group;
pub mod positions;

pub use group::{compute_group, score_wallets, GroupOutcome, WalletFailure};
pub use positions::{PositionError, PositionService};

pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod validation;
pub mod wallet_csv;

pub use config::Config;
pub use datasource::{
    DataSourceError, HttpDataSource, MockPriceOracle, MockTransferSource, PriceOracle,
    TransferHistorySource,
};
pub use domain::{
    Address, CalculatedWallet, Decimal, Direction, PnlResult, PriceQuery, PriceSample,
    RedistributionPolicy, TimeSec, TokenId, TransferEvent, WalletPnl, WalletPosition,
    WalletRecord,
};
pub use engine::{compute_pnl, reconstruct, redistribute, EngineError, LotPlan, MatchingMode};
pub use error::AppError;
pub use orchestration::{compute_group, PositionService};

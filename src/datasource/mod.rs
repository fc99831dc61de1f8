//! Data source abstraction for price/market-cap samples and wallet transfer history.

use crate::domain::{Address, PriceSample, TimeSec, TokenId, TransferEvent};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpDataSource;
pub use mock::{MockPriceOracle, MockTransferSource};

/// Price oracle for a token.
#[async_trait]
pub trait PriceOracle: Send + Sync + fmt::Debug {
    /// Fetch a price/market-cap sample.
    ///
    /// # Arguments
    /// * `token` - Token identifier
    /// * `at` - Historical point in time, or `None` for the current value
    ///
    /// # Returns
    /// `Ok(None)` when the provider has no data (a miss). A miss is never
    /// reported as a zero-valued sample.
    async fn get_price(
        &self,
        token: &TokenId,
        at: Option<TimeSec>,
    ) -> Result<Option<PriceSample>, DataSourceError>;
}

/// Source of normalized token transfers for a wallet.
#[async_trait]
pub trait TransferHistorySource: Send + Sync + fmt::Debug {
    /// Fetch every transfer of `token` into or out of `wallet`.
    ///
    /// Amounts are already normalized by token decimals. Order is unspecified.
    /// A transfer the source cannot parse fails the whole history.
    async fn get_transfer_history(
        &self,
        wallet: &Address,
        token: &TokenId,
    ) -> Result<Vec<TransferEvent>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 401 bad API key, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

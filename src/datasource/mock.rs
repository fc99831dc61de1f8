//! Mock data sources for testing without network calls.
//!
//! Only explicitly configured data is returned; anything else is a miss.

use super::{DataSourceError, PriceOracle, TransferHistorySource};
use crate::domain::{Address, PriceSample, TimeSec, TokenId, TransferEvent};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock oracle returning predefined samples.
#[derive(Debug, Clone, Default)]
pub struct MockPriceOracle {
    historical: HashMap<(TokenId, TimeSec), PriceSample>,
    current: HashMap<TokenId, PriceSample>,
    failing: HashSet<TimeSec>,
    calls: Arc<AtomicUsize>,
}

impl MockPriceOracle {
    /// Create a new mock oracle with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a historical sample for `token` at `at`.
    pub fn with_sample(mut self, token: &TokenId, at: TimeSec, sample: PriceSample) -> Self {
        self.historical.insert((token.clone(), at), sample);
        self
    }

    /// Set the current sample for `token`.
    pub fn with_current(mut self, token: &TokenId, sample: PriceSample) -> Self {
        self.current.insert(token.clone(), sample);
        self
    }

    /// Make lookups at `at` fail with a network error.
    pub fn with_failure_at(mut self, at: TimeSec) -> Self {
        self.failing.insert(at);
        self
    }

    /// Number of `get_price` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for MockPriceOracle {
    async fn get_price(
        &self,
        token: &TokenId,
        at: Option<TimeSec>,
    ) -> Result<Option<PriceSample>, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match at {
            Some(at) if self.failing.contains(&at) => Err(DataSourceError::NetworkError(
                "simulated timeout".to_string(),
            )),
            Some(at) => Ok(self.historical.get(&(token.clone(), at)).copied()),
            None => Ok(self.current.get(token).copied()),
        }
    }
}

/// Mock transfer history keyed by wallet and token.
#[derive(Debug, Clone, Default)]
pub struct MockTransferSource {
    transfers: HashMap<(Address, TokenId), Vec<TransferEvent>>,
    failing: HashSet<Address>,
}

impl MockTransferSource {
    /// Create a new mock transfer source with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add transfers for a wallet/token pair.
    pub fn with_transfers(
        mut self,
        wallet: &Address,
        token: &TokenId,
        events: Vec<TransferEvent>,
    ) -> Self {
        self.transfers
            .entry((wallet.clone(), token.clone()))
            .or_default()
            .extend(events);
        self
    }

    /// Make history lookups for `wallet` fail.
    pub fn with_failure_for(mut self, wallet: &Address) -> Self {
        self.failing.insert(wallet.clone());
        self
    }
}

#[async_trait]
impl TransferHistorySource for MockTransferSource {
    async fn get_transfer_history(
        &self,
        wallet: &Address,
        token: &TokenId,
    ) -> Result<Vec<TransferEvent>, DataSourceError> {
        if self.failing.contains(wallet) {
            return Err(DataSourceError::HttpError {
                status: 503,
                message: "simulated outage".to_string(),
            });
        }
        Ok(self
            .transfers
            .get(&(wallet.clone(), token.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

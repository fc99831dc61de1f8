use crate::datasource::{DataSourceError, PriceOracle, TransferHistorySource};
use crate::domain::{
    Address, Decimal, PriceQuery, PriceSample, TimeSec, TokenId, TransferEvent, WalletPosition,
};
use crate::engine::{EngineError, LotPlan, MatchingMode};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Reconstructs wallet positions from provider data.
///
/// Oracle failures and timeouts never escape: they are logged and treated as
/// misses, which the engine resolves through its fallback values.
#[derive(Clone)]
pub struct PositionService {
    oracle: Arc<dyn PriceOracle>,
    transfers: Arc<dyn TransferHistorySource>,
    mode: MatchingMode,
    lookup_timeout: Duration,
}

impl PositionService {
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        transfers: Arc<dyn TransferHistorySource>,
        mode: MatchingMode,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            transfers,
            mode,
            lookup_timeout,
        }
    }

    /// Fetch the wallet's transfers and reconstruct its position.
    pub async fn reconstruct(
        &self,
        wallet: &Address,
        token: &TokenId,
        fallback_market_cap: Decimal,
    ) -> Result<WalletPosition, PositionError> {
        let events = self.transfers.get_transfer_history(wallet, token).await?;
        debug!(wallet = %wallet, token = %token, events = events.len(), "Loaded transfers");
        self.reconstruct_events(token, &events, fallback_market_cap)
            .await
    }

    /// Reconstruct from already-fetched transfers.
    pub async fn reconstruct_events(
        &self,
        token: &TokenId,
        events: &[TransferEvent],
        fallback_market_cap: Decimal,
    ) -> Result<WalletPosition, PositionError> {
        let plan = LotPlan::build(events, self.mode)?;
        let samples = self.fetch_samples(token, plan.price_queries()).await;
        if plan.exit_query() == PriceQuery::Current {
            debug!(token = %token, as_of = %TimeSec::now(), "No sells, exit valued at current price");
        }
        Ok(plan.price(
            |query| samples.get(&query).copied().flatten(),
            fallback_market_cap,
        )?)
    }

    /// Reconstruct several wallets concurrently, in input order; one wallet's
    /// failure does not affect the others.
    pub async fn reconstruct_many(
        &self,
        wallets: &[Address],
        token: &TokenId,
        fallback_market_cap: Decimal,
    ) -> Vec<(Address, Result<WalletPosition, PositionError>)> {
        let tasks = wallets.iter().map(|wallet| async move {
            let result = self.reconstruct(wallet, token, fallback_market_cap).await;
            if let Err(e) = &result {
                warn!(wallet = %wallet, error = %e, "Reconstruction failed");
            }
            (wallet.clone(), result)
        });
        join_all(tasks).await
    }

    /// One sequential oracle call per distinct query.
    async fn fetch_samples(
        &self,
        token: &TokenId,
        queries: BTreeSet<PriceQuery>,
    ) -> HashMap<PriceQuery, Option<PriceSample>> {
        let mut samples = HashMap::with_capacity(queries.len());
        for query in queries {
            let lookup = self.oracle.get_price(token, query.timestamp());
            let sample = match tokio::time::timeout(self.lookup_timeout, lookup).await {
                Ok(Ok(sample)) => sample,
                Ok(Err(e)) => {
                    warn!(token = %token, query = ?query, error = %e, "Oracle lookup failed, treating as miss");
                    None
                }
                Err(_) => {
                    warn!(token = %token, query = ?query, "Oracle lookup timed out, treating as miss");
                    None
                }
            };
            samples.insert(query, sample);
        }
        samples
    }
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("transfer history unavailable: {0}")]
    History(#[from] DataSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{MockPriceOracle, MockTransferSource};
    use crate::domain::{Direction, TimeSec};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn token() -> TokenId {
        TokenId::new("MiNt".to_string())
    }

    fn service(oracle: MockPriceOracle, transfers: MockTransferSource) -> PositionService {
        PositionService::new(
            Arc::new(oracle),
            Arc::new(transfers),
            MatchingMode::Causal,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_each_distinct_query_fetched_once() {
        let oracle = MockPriceOracle::new()
            .with_sample(&token(), TimeSec::new(1), PriceSample::new(d("2"), d("1000")));
        let events = vec![
            TransferEvent::new(Direction::In, d("10"), TimeSec::new(1)),
            TransferEvent::new(Direction::In, d("5"), TimeSec::new(1)),
        ];
        let svc = service(oracle.clone(), MockTransferSource::new());

        let position = svc.reconstruct_events(&token(), &events, d("1")).await.unwrap();
        assert_eq!(position.net_invested_usd, d("30"));
        // At(1) plus Current.
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn test_oracle_error_becomes_fallback() {
        let oracle = MockPriceOracle::new().with_failure_at(TimeSec::new(1));
        let events = vec![TransferEvent::new(Direction::In, d("10"), TimeSec::new(1))];
        let svc = service(oracle, MockTransferSource::new());

        let position = svc.reconstruct_events(&token(), &events, d("777")).await.unwrap();
        assert_eq!(position.entry_market_cap, d("777"));
        assert_eq!(position.exit_market_cap, d("777"));
        assert_eq!(position.unpriced_lots, 1);
    }

    #[tokio::test]
    async fn test_history_failure_is_per_wallet() {
        let good = Address::new("GooD".to_string());
        let bad = Address::new("BaD".to_string());
        let transfers = MockTransferSource::new()
            .with_transfers(
                &good,
                &token(),
                vec![TransferEvent::new(Direction::In, d("1"), TimeSec::new(1))],
            )
            .with_failure_for(&bad);
        let svc = service(MockPriceOracle::new(), transfers);

        let results = svc
            .reconstruct_many(&[bad.clone(), good.clone()], &token(), d("100"))
            .await;
        assert!(matches!(results[0].1, Err(PositionError::History(_))));
        assert!(results[1].1.is_ok());
    }

    #[tokio::test]
    async fn test_wallet_without_buys_reports_no_buy_activity() {
        let wallet = Address::new("SeLLer".to_string());
        let transfers = MockTransferSource::new().with_transfers(
            &wallet,
            &token(),
            vec![TransferEvent::new(Direction::Out, d("1"), TimeSec::new(1))],
        );
        let svc = service(MockPriceOracle::new(), transfers);

        let err = svc.reconstruct(&wallet, &token(), d("1")).await.unwrap_err();
        assert!(matches!(err, PositionError::Engine(EngineError::NoBuyActivity)));
    }
}

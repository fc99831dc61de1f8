//! HTTP client for a Birdeye-style token data API.

use super::{DataSourceError, PriceOracle, TransferHistorySource};
use crate::domain::{
    sort_transfers_chronological, Address, Decimal, Direction, PriceSample, TimeSec, TokenId,
    TransferEvent,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "X-API-KEY";
const TRANSFER_PAGE_SIZE: usize = 50;
const MAX_TRANSFER_PAGES: usize = 200;
/// Width of the historical price window, in seconds.
const HISTORY_WINDOW_SECS: i64 = 60;

/// Token data provider reached over HTTP.
///
/// The API key is passed in at construction; nothing is read from process state.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    supply_cache: Arc<RwLock<HashMap<TokenId, Decimal>>>,
}

impl HttpDataSource {
    /// Create a new data source with a per-request timeout.
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, DataSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataSourceError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            supply_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.timeout * 3),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .header("accept", "application/json")
                .query(query)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }

    async fn token_overview(&self, token: &TokenId) -> Result<Option<Value>, DataSourceError> {
        let response = self
            .get_json("/defi/token_overview", &[("address", token.to_string())])
            .await?;
        Ok(response_data(&response).cloned())
    }

    async fn circulating_supply(&self, token: &TokenId) -> Result<Option<Decimal>, DataSourceError> {
        if let Some(supply) = self.supply_cache.read().await.get(token) {
            return Ok(Some(*supply));
        }

        let supply = self
            .token_overview(token)
            .await?
            .as_ref()
            .and_then(parse_supply);
        if let Some(supply) = supply {
            self.supply_cache.write().await.insert(token.clone(), supply);
        }
        Ok(supply)
    }

    async fn historical_price(
        &self,
        token: &TokenId,
        at: TimeSec,
    ) -> Result<Option<Decimal>, DataSourceError> {
        let query = [
            ("address", token.to_string()),
            ("address_type", "token".to_string()),
            ("type", "1m".to_string()),
            ("time_from", at.as_secs().to_string()),
            ("time_to", at.as_secs().saturating_add(HISTORY_WINDOW_SECS).to_string()),
        ];
        let response = self.get_json("/defi/history_price", &query).await?;
        Ok(response_data(&response).and_then(parse_history_price))
    }
}

#[async_trait]
impl PriceOracle for HttpDataSource {
    async fn get_price(
        &self,
        token: &TokenId,
        at: Option<TimeSec>,
    ) -> Result<Option<PriceSample>, DataSourceError> {
        debug!(token = %token, at = ?at, "Fetching price sample");

        match at {
            None => Ok(self
                .token_overview(token)
                .await?
                .as_ref()
                .and_then(parse_overview_sample)),
            Some(at) => {
                let Some(price) = self.historical_price(token, at).await? else {
                    return Ok(None);
                };
                let Some(supply) = self.circulating_supply(token).await? else {
                    warn!(token = %token, "Token supply unavailable, cannot derive market cap");
                    return Ok(None);
                };
                let Some(market_cap) = price.checked_mul(supply) else {
                    warn!(token = %token, "Market cap out of range, treating as miss");
                    return Ok(None);
                };
                Ok(Some(PriceSample::new(price, market_cap)))
            }
        }
    }
}

#[async_trait]
impl TransferHistorySource for HttpDataSource {
    async fn get_transfer_history(
        &self,
        wallet: &Address,
        token: &TokenId,
    ) -> Result<Vec<TransferEvent>, DataSourceError> {
        debug!(wallet = %wallet, token = %token, "Fetching transfer history");

        let mut events = Vec::new();
        for page in 0..MAX_TRANSFER_PAGES {
            let query = [
                ("wallet", wallet.to_string()),
                ("token", token.to_string()),
                ("offset", (page * TRANSFER_PAGE_SIZE).to_string()),
                ("limit", TRANSFER_PAGE_SIZE.to_string()),
            ];
            let response = self.get_json("/v1/wallet/token_transfers", &query).await?;
            let data = response_data(&response)
                .ok_or_else(|| DataSourceError::ParseError("Missing data field".to_string()))?;
            let items = data
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| DataSourceError::ParseError("Expected items array".to_string()))?;

            events.extend(parse_transfer_page(items, page * TRANSFER_PAGE_SIZE)?);

            let has_next = data.get("has_next").and_then(Value::as_bool).unwrap_or(true);
            if items.len() < TRANSFER_PAGE_SIZE || !has_next {
                sort_transfers_chronological(&mut events);
                return Ok(events);
            }
        }

        warn!(
            wallet = %wallet,
            token = %token,
            "Transfer history truncated after {} pages",
            MAX_TRANSFER_PAGES
        );
        sort_transfers_chronological(&mut events);
        Ok(events)
    }
}

/// The `data` payload of a successful response; `None` when the provider reports no data.
fn response_data(response: &Value) -> Option<&Value> {
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    response.get("data").filter(|d| !d.is_null())
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str_canonical(s.trim()).ok(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from_i64(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64_lossy)
            }
        }
        _ => None,
    }
}

fn field_decimal(data: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(value_to_decimal))
}

fn parse_supply(data: &Value) -> Option<Decimal> {
    field_decimal(data, &["circulatingSupply", "supply"]).filter(|s| s.is_positive())
}

fn parse_overview_sample(data: &Value) -> Option<PriceSample> {
    let price = field_decimal(data, &["price"])?;
    let market_cap = field_decimal(data, &["mc", "marketCap"])
        .or_else(|| parse_supply(data).and_then(|supply| price.checked_mul(supply)))?;
    Some(PriceSample::new(price, market_cap))
}

fn parse_history_price(data: &Value) -> Option<Decimal> {
    data.get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("value"))
        .and_then(value_to_decimal)
}

/// Parse one page of transfers. A single malformed item fails the whole
/// history, since dropping it would skew the wallet's cost basis.
fn parse_transfer_page(
    items: &[Value],
    offset: usize,
) -> Result<Vec<TransferEvent>, DataSourceError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            parse_transfer(item).map_err(|e| {
                DataSourceError::ParseError(format!("transfer #{}: {}", offset + i, e))
            })
        })
        .collect()
}

fn parse_transfer(item: &Value) -> Result<TransferEvent, DataSourceError> {
    let direction = match item.get("direction").and_then(Value::as_str) {
        Some(s) if s.eq_ignore_ascii_case("in") => Direction::In,
        Some(s) if s.eq_ignore_ascii_case("out") => Direction::Out,
        Some(s) => {
            return Err(DataSourceError::ParseError(format!(
                "Invalid direction: {}",
                s
            )))
        }
        None => {
            return Err(DataSourceError::ParseError(
                "Missing direction field".to_string(),
            ))
        }
    };

    let raw_amount = match item.get("raw_amount") {
        Some(Value::String(s)) => s
            .trim()
            .parse::<u128>()
            .map_err(|e| DataSourceError::ParseError(format!("Invalid raw_amount: {}", e)))?,
        Some(v) => v
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| DataSourceError::ParseError("Invalid raw_amount".to_string()))?,
        None => {
            return Err(DataSourceError::ParseError(
                "Missing raw_amount field".to_string(),
            ))
        }
    };

    let decimals = item
        .get("decimals")
        .and_then(Value::as_u64)
        .and_then(|d| u32::try_from(d).ok())
        .ok_or_else(|| DataSourceError::ParseError("Missing decimals field".to_string()))?;

    let timestamp = item
        .get("block_unix_time")
        .and_then(Value::as_i64)
        .ok_or_else(|| DataSourceError::ParseError("Missing block_unix_time field".to_string()))?;

    TransferEvent::from_raw(direction, raw_amount, decimals, TimeSec::new(timestamp))
        .map_err(|e| DataSourceError::ParseError(format!("Invalid amount: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_parse_transfer_valid() {
        let item = serde_json::json!({
            "direction": "in",
            "raw_amount": "1500000",
            "decimals": 6,
            "block_unix_time": 1700000000
        });

        let event = parse_transfer(&item).unwrap();
        assert_eq!(event.direction, Direction::In);
        assert_eq!(event.token_amount, d("1.5"));
        assert_eq!(event.timestamp, TimeSec::new(1_700_000_000));
    }

    #[test]
    fn test_parse_transfer_numeric_amount_and_bad_direction() {
        let item = serde_json::json!({
            "direction": "OUT",
            "raw_amount": 42,
            "decimals": 0,
            "block_unix_time": 5
        });
        assert_eq!(parse_transfer(&item).unwrap().token_amount, d("42"));

        let bad = serde_json::json!({
            "direction": "sideways",
            "raw_amount": "1",
            "decimals": 0,
            "block_unix_time": 5
        });
        assert!(matches!(parse_transfer(&bad), Err(DataSourceError::ParseError(_))));
    }

    #[test]
    fn test_raw_amount_above_u64_parses() {
        let item = serde_json::json!({
            "direction": "out",
            "raw_amount": "184467440737095516150",
            "decimals": 9,
            "block_unix_time": 5
        });
        let event = parse_transfer(&item).unwrap();
        assert_eq!(event.token_amount, d("184467440737.09551615"));
    }

    #[test]
    fn test_malformed_item_fails_the_page() {
        let items = vec![
            serde_json::json!({"direction": "in", "raw_amount": "100", "decimals": 0, "block_unix_time": 1}),
            serde_json::json!({"direction": "out", "raw_amount": "40", "block_unix_time": 2}),
            serde_json::json!({"direction": "in", "raw_amount": "5", "decimals": 0, "block_unix_time": 3}),
        ];
        match parse_transfer_page(&items, 50).unwrap_err() {
            DataSourceError::ParseError(msg) => {
                assert!(msg.contains("transfer #51"));
                assert!(msg.contains("decimals"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let valid = vec![items[0].clone(), items[2].clone()];
        assert_eq!(parse_transfer_page(&valid, 0).unwrap().len(), 2);
    }

    #[test]
    fn test_overview_sample_prefers_reported_market_cap() {
        let data = serde_json::json!({"price": "0.5", "mc": 1000000, "circulatingSupply": 10});
        let sample = parse_overview_sample(&data).unwrap();
        assert_eq!(sample.price, d("0.5"));
        assert_eq!(sample.market_cap, d("1000000"));
    }

    #[test]
    fn test_overview_sample_derives_market_cap_from_supply() {
        let data = serde_json::json!({"price": "2", "supply": "1000"});
        let sample = parse_overview_sample(&data).unwrap();
        assert_eq!(sample.market_cap, d("2000"));

        let huge = serde_json::json!({"price": "1000000000000000", "supply": "1000000000000000"});
        assert!(parse_overview_sample(&huge).is_none());
    }

    #[test]
    fn test_overview_without_price_is_a_miss() {
        let data = serde_json::json!({"mc": 1000});
        assert_eq!(parse_overview_sample(&data), None);
    }

    #[test]
    fn test_zero_price_is_a_sample_not_a_miss() {
        let data = serde_json::json!({"price": 0, "mc": 0});
        assert_eq!(
            parse_overview_sample(&data),
            Some(PriceSample::new(Decimal::zero(), Decimal::zero()))
        );
    }

    #[test]
    fn test_history_price_first_item() {
        let data = serde_json::json!({"items": [{"unixTime": 1, "value": "0.25"}, {"unixTime": 61, "value": "0.3"}]});
        assert_eq!(parse_history_price(&data), Some(d("0.25")));

        let empty = serde_json::json!({"items": []});
        assert_eq!(parse_history_price(&empty), None);
    }

    #[test]
    fn test_response_data_unsuccessful_is_none() {
        let response = serde_json::json!({"success": false, "data": {"price": 1}});
        assert!(response_data(&response).is_none());

        let null = serde_json::json!({"success": true, "data": null});
        assert!(response_data(&null).is_none());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let source = HttpDataSource::new(
            "https://example.invalid/".to_string(),
            "key".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(source.base_url, "https://example.invalid");
    }
}

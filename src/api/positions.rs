use crate::api::AppState;
use crate::domain::{Address, Decimal, TokenId, WalletPosition, WalletRecord};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    pub wallet_address: String,
    pub token_id: String,
    /// Display name for the populated record; defaults to the token id.
    pub token_name: Option<String>,
    pub fallback_market_cap: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub position: WalletPosition,
    /// Group record populated from the position, ready for `/v1/redistribution`.
    pub wallet: WalletRecord,
}

pub async fn reconstruct_position(
    State(state): State<AppState>,
    Json(request): Json<PositionRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    let wallet = Address::from_str(&request.wallet_address)
        .map_err(|_| AppError::BadRequest("Invalid wallet address".into()))?;
    let token = TokenId::from_str(&request.token_id)
        .map_err(|_| AppError::BadRequest("Invalid token id".into()))?;
    if request.fallback_market_cap.is_negative() {
        return Err(AppError::BadRequest(
            "fallbackMarketCap must be >= 0".into(),
        ));
    }

    let position = state
        .positions
        .reconstruct(&wallet, &token, request.fallback_market_cap)
        .await?;

    let token_name = request
        .token_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| token.to_string());
    let record = WalletRecord::from_position(wallet.as_str(), token_name, &position);

    Ok(Json(PositionResponse {
        position,
        wallet: record,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPositionRequest {
    pub wallet_addresses: Vec<String>,
    pub token_id: String,
    pub token_name: Option<String>,
    pub fallback_market_cap: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPositionEntry {
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<WalletPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reconstruct every wallet in the batch; failures are reported per wallet.
pub async fn reconstruct_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchPositionRequest>,
) -> Result<Json<Vec<BatchPositionEntry>>, AppError> {
    let token = TokenId::from_str(&request.token_id)
        .map_err(|_| AppError::BadRequest("Invalid token id".into()))?;
    if request.fallback_market_cap.is_negative() {
        return Err(AppError::BadRequest(
            "fallbackMarketCap must be >= 0".into(),
        ));
    }
    let wallets = request
        .wallet_addresses
        .iter()
        .map(|raw| Address::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AppError::BadRequest("Invalid wallet address".into()))?;

    let token_name = request
        .token_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| token.to_string());

    let entries = state
        .positions
        .reconstruct_many(&wallets, &token, request.fallback_market_cap)
        .await
        .into_iter()
        .map(|(wallet, result)| match result {
            Ok(position) => BatchPositionEntry {
                wallet_address: wallet.to_string(),
                wallet: Some(WalletRecord::from_position(
                    wallet.as_str(),
                    token_name.clone(),
                    &position,
                )),
                position: Some(position),
                error: None,
            },
            Err(e) => BatchPositionEntry {
                wallet_address: wallet.to_string(),
                position: None,
                wallet: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(Json(entries))
}

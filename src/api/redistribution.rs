use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{CalculatedWallet, Decimal, RedistributionPolicy, WalletRecord};
use crate::orchestration::{compute_group, WalletFailure};
use crate::validation::PolicyAdvisory;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedistributionRequest {
    pub wallets: Vec<WalletRecord>,
    /// Falls back to the configured default policy.
    pub policy: Option<RedistributionPolicy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedistributionResponse {
    pub policy: &'static str,
    pub pool: Decimal,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub wallets: Vec<CalculatedWallet>,
    pub rejected: Vec<WalletFailure>,
    pub advisories: Vec<PolicyAdvisory>,
}

pub async fn redistribute_group(
    State(state): State<AppState>,
    Json(request): Json<RedistributionRequest>,
) -> Json<RedistributionResponse> {
    let policy = request
        .policy
        .unwrap_or_else(|| state.config.default_policy.clone());

    let outcome = compute_group(&request.wallets, &policy);

    Json(RedistributionResponse {
        policy: policy.name(),
        pool: outcome.summary.pool(&policy),
        total_profit: outcome.summary.total_profit,
        total_loss: outcome.summary.total_loss,
        wallets: outcome.wallets,
        rejected: outcome.rejected,
        advisories: outcome.advisories,
    })
}

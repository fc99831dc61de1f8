use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{PnlResult, WalletRecord};
use crate::orchestration::score_wallets;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlRequest {
    pub wallets: Vec<WalletRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PnlResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-wallet PnL; a wallet that fails is reported in place and the rest still compute.
pub async fn compute_pnl(Json(request): Json<PnlRequest>) -> Json<Vec<PnlEntry>> {
    let entries = score_wallets(&request.wallets)
        .into_iter()
        .map(|(record, result)| match result {
            Ok(pnl) => PnlEntry {
                id: record.id.clone(),
                result: Some(pnl),
                error: None,
            },
            Err(e) => PnlEntry {
                id: record.id.clone(),
                result: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Json(entries)
}

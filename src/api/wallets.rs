use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::domain::{CalculatedWallet, WalletRecord};
use crate::error::AppError;
use crate::wallet_csv;

/// Parse a CSV body into wallet records.
pub async fn import_wallets(body: String) -> Result<Json<Vec<WalletRecord>>, AppError> {
    let records = wallet_csv::import_wallets(body.as_bytes())?;
    tracing::debug!(rows = records.len(), "Imported wallets from CSV");
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub wallets: Vec<CalculatedWallet>,
}

pub async fn export_wallets(
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let csv = wallet_csv::export_wallets_to_string(&request.wallets)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}

//! Wallet-level values flowing through reconstruction, PnL and redistribution.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Reconstructed summary for one wallet/token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPosition {
    /// Cost basis of the token units never subsequently sold.
    pub net_invested_usd: Decimal,
    pub entry_market_cap: Decimal,
    pub exit_market_cap: Decimal,
    /// Residual lots valued at 0 because their historical price was unavailable.
    pub unpriced_lots: usize,
}

pub fn new_wallet_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One wallet of the group, as entered, imported or populated from a [`WalletPosition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    #[serde(default = "new_wallet_id")]
    pub id: String,
    pub wallet_address: String,
    pub token_name: String,
    pub invested_amount: Decimal,
    pub entry_market_cap: Decimal,
    pub exit_market_cap: Decimal,
}

impl WalletRecord {
    pub fn new(
        id: impl Into<String>,
        wallet_address: impl Into<String>,
        token_name: impl Into<String>,
        invested_amount: Decimal,
        entry_market_cap: Decimal,
        exit_market_cap: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            wallet_address: wallet_address.into(),
            token_name: token_name.into(),
            invested_amount,
            entry_market_cap,
            exit_market_cap,
        }
    }

    /// Populate a record from a reconstructed position.
    pub fn from_position(
        wallet_address: impl Into<String>,
        token_name: impl Into<String>,
        position: &WalletPosition,
    ) -> Self {
        Self::new(
            new_wallet_id(),
            wallet_address,
            token_name,
            position.net_invested_usd,
            position.entry_market_cap,
            position.exit_market_cap,
        )
    }
}

/// Output of the PnL engine for one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResult {
    pub raw_pnl: Decimal,
    pub pnl_percentage: Decimal,
    /// `raw_pnl > 0`; a wallet that exactly broke even counts as a loser.
    pub is_profit: bool,
}

/// A wallet paired with its computed PnL; the redistribution engine's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletPnl {
    pub wallet: WalletRecord,
    pub pnl: PnlResult,
}

/// A wallet annotated with its PnL and redistribution outcome.
///
/// `final_balance == invested_amount + raw_pnl + redistribution_amount` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedWallet {
    #[serde(flatten)]
    pub wallet: WalletRecord,
    pub raw_pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub redistribution_amount: Decimal,
    pub final_balance: Decimal,
    pub is_profit: bool,
}

impl CalculatedWallet {
    /// `None` when the final balance overflows.
    pub fn try_new(entry: &WalletPnl, redistribution_amount: Decimal) -> Option<Self> {
        let final_balance = entry
            .wallet
            .invested_amount
            .checked_add(entry.pnl.raw_pnl)?
            .checked_add(redistribution_amount)?;
        Some(Self {
            wallet: entry.wallet.clone(),
            raw_pnl: entry.pnl.raw_pnl,
            pnl_percentage: entry.pnl.pnl_percentage,
            redistribution_amount,
            final_balance,
            is_profit: entry.pnl.is_profit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_record_deserialize_assigns_id_when_missing() {
        let json = serde_json::json!({
            "walletAddress": "WaLLet1",
            "tokenName": "BONK",
            "investedAmount": 1000,
            "entryMarketCap": 1000000,
            "exitMarketCap": 2000000
        });
        let record: WalletRecord = serde_json::from_value(json).unwrap();
        assert!(!record.id.is_empty());
        assert_eq!(record.invested_amount, d("1000"));
    }

    #[test]
    fn test_calculated_wallet_final_balance() {
        let entry = WalletPnl {
            wallet: WalletRecord::new("a", "WaLLet1", "BONK", d("1000"), d("10"), d("5")),
            pnl: PnlResult {
                raw_pnl: d("-500"),
                pnl_percentage: d("-50"),
                is_profit: false,
            },
        };
        let calculated = CalculatedWallet::try_new(&entry, d("200")).unwrap();
        assert_eq!(calculated.final_balance, d("700"));
        assert!(!calculated.is_profit);
    }

    #[test]
    fn test_calculated_wallet_serializes_flat() {
        let entry = WalletPnl {
            wallet: WalletRecord::new("a", "WaLLet1", "BONK", d("1000"), d("10"), d("20")),
            pnl: PnlResult {
                raw_pnl: d("1000"),
                pnl_percentage: d("100"),
                is_profit: true,
            },
        };
        let json = serde_json::to_value(CalculatedWallet::try_new(&entry, d("0")).unwrap()).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["walletAddress"], "WaLLet1");
        assert_eq!(json["rawPnl"], 1000.0);
        assert_eq!(json["finalBalance"], 2000.0);
        assert_eq!(json["isProfit"], true);
    }

    #[test]
    fn test_from_position() {
        let position = WalletPosition {
            net_invested_usd: d("12.5"),
            entry_market_cap: d("100"),
            exit_market_cap: d("300"),
            unpriced_lots: 0,
        };
        let record = WalletRecord::from_position("WaLLet1", "BONK", &position);
        assert_eq!(record.invested_amount, d("12.5"));
        assert_eq!(record.exit_market_cap, d("300"));
    }
}

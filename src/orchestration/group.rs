//! Batch PnL + redistribution over a wallet group.

use crate::domain::{CalculatedWallet, PnlResult, RedistributionPolicy, WalletPnl, WalletRecord};
use crate::engine::{compute_pnl, redistribute, EngineError, GroupSummary};
use crate::validation::{check_policy, PolicyAdvisory};
use serde::Serialize;
use tracing::warn;

/// A wallet excluded from the batch, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletFailure {
    pub id: String,
    pub error: String,
}

impl WalletFailure {
    fn new(id: &str, error: &EngineError) -> Self {
        Self {
            id: id.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupOutcome {
    /// Wallets that could be scored, in input order.
    pub wallets: Vec<CalculatedWallet>,
    pub rejected: Vec<WalletFailure>,
    pub advisories: Vec<PolicyAdvisory>,
    pub summary: GroupSummary,
}

/// PnL for each record, in input order.
pub fn score_wallets(records: &[WalletRecord]) -> Vec<(&WalletRecord, Result<PnlResult, EngineError>)> {
    records
        .iter()
        .map(|record| (record, compute_pnl(record)))
        .collect()
}

/// Score every wallet and redistribute among those that could be scored.
///
/// Wallets whose PnL cannot be computed (out-of-range fields included) are
/// reported in `rejected` and left out of the pool; they never alter the other
/// wallets' results. When the group totals overflow, every wallet is rejected.
pub fn compute_group(records: &[WalletRecord], policy: &RedistributionPolicy) -> GroupOutcome {
    let mut scored = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (record, result) in score_wallets(records) {
        match result {
            Ok(pnl) => scored.push(WalletPnl {
                wallet: record.clone(),
                pnl,
            }),
            Err(e) => {
                warn!(wallet_id = %record.id, error = %e, "Excluding wallet from redistribution");
                rejected.push(WalletFailure::new(&record.id, &e));
            }
        }
    }

    let advisories = check_policy(&scored, policy);
    for advisory in &advisories {
        warn!(advisory = ?advisory, "Policy input advisory");
    }

    let redistributed = GroupSummary::from_entries(&scored)
        .and_then(|summary| Ok((summary, redistribute(&scored, policy)?)));
    match redistributed {
        Ok((summary, wallets)) => GroupOutcome {
            wallets,
            rejected,
            advisories,
            summary,
        },
        Err(e) => {
            warn!(error = %e, wallets = scored.len(), "Group cannot be redistributed");
            rejected.extend(scored.iter().map(|entry| WalletFailure::new(&entry.wallet.id, &e)));
            GroupOutcome {
                wallets: Vec::new(),
                rejected,
                advisories,
                summary: GroupSummary::default(),
            }
        }
    }
}

//! Caller-side checks of redistribution inputs.
//!
//! The engine applies custom percentages as given; these checks surface
//! inconsistent inputs without correcting them.

use crate::domain::{Decimal, RedistributionPolicy, WalletPnl};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Allowed distance of the loser percentages' sum from 100.
fn percentage_tolerance() -> Decimal {
    Decimal::new(rust_decimal::Decimal::new(1, 2))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PolicyAdvisory {
    /// Custom percentages cannot produce a zero-sum result as given.
    PolicyInputInconsistent { message: String },
    /// Two records share an id, so per-id percentages are ambiguous.
    DuplicateWalletId { id: String },
}

impl PolicyAdvisory {
    fn inconsistent(message: String) -> Self {
        PolicyAdvisory::PolicyInputInconsistent { message }
    }
}

pub fn check_policy(entries: &[WalletPnl], policy: &RedistributionPolicy) -> Vec<PolicyAdvisory> {
    let mut advisories = Vec::new();

    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.wallet.id.as_str()) {
            duplicates.insert(entry.wallet.id.clone());
        }
    }
    advisories.extend(
        duplicates
            .into_iter()
            .map(|id| PolicyAdvisory::DuplicateWalletId { id }),
    );

    let RedistributionPolicy::CustomPercentage { percentages } = policy else {
        return advisories;
    };

    let losers: HashSet<&str> = entries
        .iter()
        .filter(|e| !e.pnl.is_profit)
        .map(|e| e.wallet.id.as_str())
        .collect();
    let winners: HashSet<&str> = entries
        .iter()
        .filter(|e| e.pnl.is_profit)
        .map(|e| e.wallet.id.as_str())
        .collect();

    let mut ids: Vec<&String> = percentages.keys().collect();
    ids.sort();
    for id in ids {
        let pct = percentages[id];
        if pct.is_negative() {
            advisories.push(PolicyAdvisory::inconsistent(format!(
                "percentage for wallet {} is negative ({})",
                id, pct
            )));
        }
        if winners.contains(id.as_str()) {
            advisories.push(PolicyAdvisory::inconsistent(format!(
                "percentage assigned to winning wallet {} is ignored",
                id
            )));
        } else if !losers.contains(id.as_str()) {
            advisories.push(PolicyAdvisory::inconsistent(format!(
                "percentage assigned to unknown wallet {}",
                id
            )));
        }
    }

    if !winners.is_empty() && !losers.is_empty() {
        let total =
            Decimal::checked_sum(losers.iter().filter_map(|id| percentages.get(*id).copied()));
        match total {
            Some(total) if (total - Decimal::hundred()).abs() <= percentage_tolerance() => {}
            Some(total) => advisories.push(PolicyAdvisory::inconsistent(format!(
                "custom percentages over losing wallets sum to {}, expected 100",
                total
            ))),
            None => advisories.push(PolicyAdvisory::inconsistent(
                "custom percentages over losing wallets overflow".to_string(),
            )),
        }
    }

    advisories
}

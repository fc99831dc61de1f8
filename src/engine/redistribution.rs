//! Zero-sum redistribution of group profit to losing wallets.

use crate::domain::{CalculatedWallet, Decimal, RedistributionPolicy, WalletPnl};
use tracing::debug;

use super::EngineError;

/// Aggregates of a group's PnL split into winners and losers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupSummary {
    pub winners: usize,
    pub losers: usize,
    /// Sum of `raw_pnl` over winners.
    pub total_profit: Decimal,
    /// Sum of `|raw_pnl|` over losers.
    pub total_loss: Decimal,
}

impl GroupSummary {
    pub fn from_entries(entries: &[WalletPnl]) -> Result<Self, EngineError> {
        let mut summary = GroupSummary::default();
        for entry in entries {
            if entry.pnl.is_profit {
                summary.winners += 1;
                summary.total_profit = summary
                    .total_profit
                    .checked_add(entry.pnl.raw_pnl)
                    .ok_or(EngineError::GroupOverflow)?;
            } else {
                summary.losers += 1;
                summary.total_loss = summary
                    .total_loss
                    .checked_add(entry.pnl.raw_pnl.abs())
                    .ok_or(EngineError::GroupOverflow)?;
            }
        }
        Ok(summary)
    }

    /// Redistribution only happens when both sides are non-empty.
    pub fn is_redistributable(&self) -> bool {
        self.winners > 0 && self.losers > 0
    }

    /// Amount moved from winners to losers under `policy`.
    ///
    /// Capped at `min(total_profit, total_loss)` except for
    /// [`RedistributionPolicy::FullClawback`], which moves all profit.
    pub fn pool(&self, policy: &RedistributionPolicy) -> Decimal {
        if !self.is_redistributable() {
            return Decimal::zero();
        }
        match policy {
            RedistributionPolicy::FullClawback => self.total_profit,
            _ => self.total_profit.min(self.total_loss),
        }
    }
}

/// Annotate every wallet with its redistribution amount and final balance.
///
/// Output order matches input order. The adjustments sum to zero for every
/// policy except a [`RedistributionPolicy::CustomPercentage`] whose loser
/// percentages do not add up to 100. Fails with [`EngineError::GroupOverflow`]
/// when a total or balance leaves the decimal range.
pub fn redistribute(
    entries: &[WalletPnl],
    policy: &RedistributionPolicy,
) -> Result<Vec<CalculatedWallet>, EngineError> {
    let summary = GroupSummary::from_entries(entries)?;
    if !summary.is_redistributable() {
        debug!(
            winners = summary.winners,
            losers = summary.losers,
            "Nothing to redistribute"
        );
        return entries
            .iter()
            .map(|entry| annotate(entry, Decimal::zero()))
            .collect();
    }

    let pool = summary.pool(policy);
    debug!(
        policy = policy.name(),
        pool = %pool,
        total_profit = %summary.total_profit,
        total_loss = %summary.total_loss,
        "Redistributing group PnL"
    );

    entries
        .iter()
        .map(|entry| {
            let amount = if entry.pnl.is_profit {
                winner_amount(entry, policy, pool, &summary)
            } else {
                loser_amount(entry, policy, pool, &summary)
            };
            annotate(entry, amount.ok_or(EngineError::GroupOverflow)?)
        })
        .collect()
}

fn annotate(entry: &WalletPnl, amount: Decimal) -> Result<CalculatedWallet, EngineError> {
    CalculatedWallet::try_new(entry, amount).ok_or(EngineError::GroupOverflow)
}

fn winner_amount(
    entry: &WalletPnl,
    policy: &RedistributionPolicy,
    pool: Decimal,
    summary: &GroupSummary,
) -> Option<Decimal> {
    match policy {
        RedistributionPolicy::FullClawback => Some(-entry.pnl.raw_pnl),
        _ => {
            let share = entry
                .pnl
                .raw_pnl
                .checked_div(summary.total_profit)
                .unwrap_or_default();
            pool.checked_mul(share).map(|amount| -amount)
        }
    }
}

fn loser_amount(
    entry: &WalletPnl,
    policy: &RedistributionPolicy,
    pool: Decimal,
    summary: &GroupSummary,
) -> Option<Decimal> {
    let losers = Decimal::from_i64(summary.losers as i64);
    match policy {
        RedistributionPolicy::EqualShare | RedistributionPolicy::FullClawback => {
            pool.checked_div(losers)
        }
        RedistributionPolicy::Proportional => {
            let share = entry
                .pnl
                .raw_pnl
                .abs()
                .checked_div(summary.total_loss)
                .unwrap_or_default();
            pool.checked_mul(share)
        }
        RedistributionPolicy::CustomPercentage { percentages } => {
            let pct = percentages
                .get(&entry.wallet.id)
                .copied()
                .unwrap_or_default();
            pool.checked_mul(pct)?.checked_div(Decimal::hundred())
        }
    }
}

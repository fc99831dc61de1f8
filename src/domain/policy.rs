//! Redistribution policies.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// How the redistribution pool is split among losers (and funded by winners).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RedistributionPolicy {
    /// Every loser receives `pool / losers`.
    #[default]
    EqualShare,
    /// Each loser receives a share of the pool proportional to its loss.
    Proportional,
    /// Each loser receives `pool * percentages[id] / 100`.
    ///
    /// The caller must supply percentages that sum to 100 across losers; the
    /// engine neither validates nor renormalizes them. See
    /// [`crate::validation::check_policy`].
    CustomPercentage { percentages: HashMap<String, Decimal> },
    /// Winners surrender all profit (ending at break-even), shared equally by losers.
    ///
    /// Unlike the other policies the transfer is not capped at total loss.
    FullClawback,
}

impl RedistributionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            RedistributionPolicy::EqualShare => "equal",
            RedistributionPolicy::Proportional => "proportional",
            RedistributionPolicy::CustomPercentage { .. } => "custom",
            RedistributionPolicy::FullClawback => "clawback",
        }
    }
}

/// Parses the parameterless policies by their short name.
impl FromStr for RedistributionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equal" | "equalshare" => Ok(RedistributionPolicy::EqualShare),
            "proportional" => Ok(RedistributionPolicy::Proportional),
            "clawback" | "fullclawback" => Ok(RedistributionPolicy::FullClawback),
            _ => Err(()),
        }
    }
}

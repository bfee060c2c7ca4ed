//! Incentive parameters
//!
//! Reward periods say how many reward coins each source emits per second and
//! when. Multipliers trade payout size against lockup length per reward denom.

use chrono::{DateTime, Utc};
use harbor_core::{validate_denom, Coins};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use strum_macros::{Display, EnumString};

use crate::claim::RewardCategory;
use crate::error::{IncentiveError, IncentiveResult};

/// Rewards emitted for one source between `start` and `end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRewardPeriod {
    #[serde(default = "default_active")]
    pub active: bool,
    /// Source id: a denom, the bond denom or a pool id
    pub collateral_type: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub rewards_per_second: Coins,
}

fn default_active() -> bool {
    true
}

impl MultiRewardPeriod {
    pub fn new(
        collateral_type: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        rewards_per_second: Coins,
    ) -> Self {
        Self {
            active: true,
            collateral_type: collateral_type.into(),
            start,
            end,
            rewards_per_second,
        }
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        if self.start.timestamp() == 0 || self.end.timestamp() == 0 {
            return Err(IncentiveError::InvalidParams(format!(
                "start and end times of {} must be set",
                self.collateral_type
            )));
        }
        if self.start > self.end {
            return Err(IncentiveError::InvalidParams(format!(
                "end period time {} cannot be before start time {}",
                self.end, self.start
            )));
        }
        for denom in self.rewards_per_second.denoms() {
            validate_denom(denom)?;
        }
        if self.collateral_type.trim().is_empty() {
            return Err(IncentiveError::InvalidParams(
                "reward period collateral type cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_periods(periods: &[MultiRewardPeriod]) -> IncentiveResult<()> {
    let mut seen = BTreeSet::new();
    for period in periods {
        if !seen.insert(period.collateral_type.as_str()) {
            return Err(IncentiveError::InvalidParams(format!(
                "duplicated reward period with collateral type {}",
                period.collateral_type
            )));
        }
        period.validate()?;
    }
    Ok(())
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MultiplierName {
    Small,
    Medium,
    Large,
}

/// Payout discount in exchange for a lockup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    pub name: MultiplierName,
    pub months_lockup: i64,
    pub factor: Decimal,
}

impl Multiplier {
    pub fn new(name: MultiplierName, months_lockup: i64, factor: Decimal) -> Self {
        Self {
            name,
            months_lockup,
            factor,
        }
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        if self.months_lockup < 0 {
            return Err(IncentiveError::InvalidParams(format!(
                "expected non-negative lockup, got {}",
                self.months_lockup
            )));
        }
        if self.factor.is_sign_negative() {
            return Err(IncentiveError::InvalidParams(format!(
                "expected non-negative factor, got {}",
                self.factor
            )));
        }
        Ok(())
    }
}

/// Multipliers offered for one reward denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipliersPerDenom {
    pub denom: String,
    pub multipliers: Vec<Multiplier>,
}

/// Incentive module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveParams {
    #[serde(default)]
    pub supply_reward_periods: Vec<MultiRewardPeriod>,
    #[serde(default)]
    pub borrow_reward_periods: Vec<MultiRewardPeriod>,
    #[serde(default)]
    pub delegator_reward_periods: Vec<MultiRewardPeriod>,
    #[serde(default)]
    pub swap_reward_periods: Vec<MultiRewardPeriod>,
    #[serde(default)]
    pub claim_multipliers: Vec<MultipliersPerDenom>,

    /// Claims are rejected after this time
    #[serde(default = "default_claim_end")]
    pub claim_end: DateTime<Utc>,

    /// Source id of delegator rewards
    #[serde(default = "default_bond_denom")]
    pub bond_denom: String,

    /// Module account that pays out rewards
    #[serde(default = "default_funding_module")]
    pub funding_module: String,
}

fn default_claim_end() -> DateTime<Utc> {
    DateTime::from_timestamp(1, 0).unwrap_or_default()
}

fn default_bond_denom() -> String {
    "ukava".to_string()
}

fn default_funding_module() -> String {
    "incentive".to_string()
}

impl Default for IncentiveParams {
    fn default() -> Self {
        Self {
            supply_reward_periods: Vec::new(),
            borrow_reward_periods: Vec::new(),
            delegator_reward_periods: Vec::new(),
            swap_reward_periods: Vec::new(),
            claim_multipliers: Vec::new(),
            claim_end: default_claim_end(),
            bond_denom: default_bond_denom(),
            funding_module: default_funding_module(),
        }
    }
}

impl IncentiveParams {
    /// Load and validate parameters from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        params
            .validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(params)
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        for category in RewardCategory::ALL {
            validate_periods(self.periods(category))?;
        }

        let mut denoms = BTreeSet::new();
        for per_denom in &self.claim_multipliers {
            if !denoms.insert(per_denom.denom.as_str()) {
                return Err(IncentiveError::InvalidParams(format!(
                    "duplicated multipliers for denom {}",
                    per_denom.denom
                )));
            }
            validate_denom(&per_denom.denom)?;
            let mut names = BTreeSet::new();
            for multiplier in &per_denom.multipliers {
                if !names.insert(multiplier.name) {
                    return Err(IncentiveError::InvalidParams(format!(
                        "duplicated multiplier {} for denom {}",
                        multiplier.name, per_denom.denom
                    )));
                }
                multiplier.validate()?;
            }
        }

        if self.claim_end.timestamp() == 0 {
            return Err(IncentiveError::InvalidParams(
                "claim end time should not be zero".to_string(),
            ));
        }
        validate_denom(&self.bond_denom)?;
        if self.funding_module.trim().is_empty() {
            return Err(IncentiveError::InvalidParams(
                "funding module name is blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Reward periods of a category
    pub fn periods(&self, category: RewardCategory) -> &[MultiRewardPeriod] {
        match category {
            RewardCategory::Supply => &self.supply_reward_periods,
            RewardCategory::Borrow => &self.borrow_reward_periods,
            RewardCategory::Delegator => &self.delegator_reward_periods,
            RewardCategory::Pool => &self.swap_reward_periods,
        }
    }

    pub fn multiplier(&self, denom: &str, name: MultiplierName) -> Option<&Multiplier> {
        self.claim_multipliers
            .iter()
            .find(|m| m.denom == denom)
            .and_then(|m| m.multipliers.iter().find(|m| m.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use harbor_core::Coin;
    use rust_decimal_macros::dec;

    fn period(source: &str) -> MultiRewardPeriod {
        MultiRewardPeriod::new(
            source,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
            Coins::from(Coin::from_units("hard", 100)),
        )
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let params: IncentiveParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, IncentiveParams::default());
        assert_eq!(params.bond_denom, "ukava");
        assert_eq!(params.funding_module, "incentive");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_period_start_after_end() {
        let mut bad = period("ukava");
        std::mem::swap(&mut bad.start, &mut bad.end);
        assert!(matches!(bad.validate(), Err(IncentiveError::InvalidParams(_))));
    }

    #[test]
    fn test_blank_collateral_type() {
        assert!(period("  ").validate().is_err());
    }

    #[test]
    fn test_duplicate_periods_rejected() {
        let params = IncentiveParams {
            borrow_reward_periods: vec![period("usdx"), period("usdx")],
            ..IncentiveParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_multiplier_lookup() {
        let params = IncentiveParams {
            claim_multipliers: vec![MultipliersPerDenom {
                denom: "hard".to_string(),
                multipliers: vec![
                    Multiplier::new(MultiplierName::Small, 1, dec!(0.2)),
                    Multiplier::new(MultiplierName::Large, 12, dec!(1.0)),
                ],
            }],
            ..IncentiveParams::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(
            params.multiplier("hard", MultiplierName::Large).map(|m| m.months_lockup),
            Some(12)
        );
        assert!(params.multiplier("hard", MultiplierName::Medium).is_none());
        assert!(params.multiplier("swp", MultiplierName::Small).is_none());
    }

    #[test]
    fn test_negative_lockup_rejected() {
        assert!(Multiplier::new(MultiplierName::Small, -1, dec!(0.2)).validate().is_err());
        assert!(Multiplier::new(MultiplierName::Small, 1, dec!(-0.2)).validate().is_err());
    }

    #[test]
    fn test_multiplier_name_parsing() {
        assert_eq!("Large".parse::<MultiplierName>().unwrap(), MultiplierName::Large);
        assert_eq!("small".parse::<MultiplierName>().unwrap(), MultiplierName::Small);
        assert!("huge".parse::<MultiplierName>().is_err());
    }
}

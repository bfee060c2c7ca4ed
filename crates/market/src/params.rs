//! Money market parameters
//!
//! Parameters are passed to the keeper at construction. They only change
//! through a governance-approved update that validates the new set first.

use harbor_core::validate_denom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{MarketError, MarketResult};

/// Per-asset borrow cap and collateral ratio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowLimit {
    /// Whether `maximum_limit` caps the protocol-wide borrowed amount
    #[serde(default)]
    pub has_max_limit: bool,

    /// Protocol-wide cap in base units
    #[serde(default)]
    pub maximum_limit: Decimal,

    /// Fraction of the collateral's USD value that may be borrowed against it
    pub loan_to_value: Decimal,
}

/// Kinked utilization rate model; all rates are APY
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRateModel {
    pub base_rate_apy: Decimal,
    pub base_multiplier: Decimal,
    pub kink: Decimal,
    pub jump_multiplier: Decimal,
}

impl InterestRateModel {
    pub fn validate(&self) -> MarketResult<()> {
        if self.base_rate_apy.is_sign_negative() || self.base_rate_apy > Decimal::ONE {
            return Err(MarketError::InvalidParams(format!(
                "base rate APY must be in [0, 1]: {}",
                self.base_rate_apy
            )));
        }
        if self.base_multiplier.is_sign_negative() {
            return Err(MarketError::InvalidParams(format!(
                "base multiplier must be non-negative: {}",
                self.base_multiplier
            )));
        }
        if !unit_interval(self.kink) {
            return Err(MarketError::InvalidParams(format!(
                "kink must be in [0, 1]: {}",
                self.kink
            )));
        }
        if self.jump_multiplier.is_sign_negative() {
            return Err(MarketError::InvalidParams(format!(
                "jump multiplier must be non-negative: {}",
                self.jump_multiplier
            )));
        }
        Ok(())
    }
}

/// A lending market for one denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyMarket {
    pub denom: String,
    pub borrow_limit: BorrowLimit,
    /// Price feed market used to value the denom in USD
    pub spot_market_id: String,
    /// Base units per whole unit (e.g. 1_000_000 for `ukava`)
    pub conversion_factor: Decimal,
    pub interest_rate_model: InterestRateModel,
    /// Fraction of borrow interest kept as reserves
    pub reserve_factor: Decimal,
    /// Fraction of seized collateral paid to the liquidating keeper
    pub keeper_reward_percentage: Decimal,
}

impl MoneyMarket {
    pub fn validate(&self) -> MarketResult<()> {
        validate_denom(&self.denom)?;
        if !unit_interval(self.borrow_limit.loan_to_value) {
            return Err(MarketError::InvalidParams(format!(
                "loan-to-value for {} must be in [0, 1]: {}",
                self.denom, self.borrow_limit.loan_to_value
            )));
        }
        if self.borrow_limit.maximum_limit.is_sign_negative() {
            return Err(MarketError::InvalidParams(format!(
                "maximum limit for {} must be non-negative",
                self.denom
            )));
        }
        if self.spot_market_id.trim().is_empty() {
            return Err(MarketError::InvalidParams(format!(
                "spot market id for {} is blank",
                self.denom
            )));
        }
        if self.conversion_factor <= Decimal::ZERO {
            return Err(MarketError::InvalidParams(format!(
                "conversion factor for {} must be positive",
                self.denom
            )));
        }
        self.interest_rate_model.validate()?;
        if !unit_interval(self.reserve_factor) {
            return Err(MarketError::InvalidParams(format!(
                "reserve factor for {} must be in [0, 1]: {}",
                self.denom, self.reserve_factor
            )));
        }
        if !unit_interval(self.keeper_reward_percentage) {
            return Err(MarketError::InvalidParams(format!(
                "keeper reward for {} must be in [0, 1]: {}",
                self.denom, self.keeper_reward_percentage
            )));
        }
        Ok(())
    }
}

/// Money market module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    #[serde(default)]
    pub money_markets: Vec<MoneyMarket>,

    /// Smallest USD value an outstanding borrow may have
    #[serde(default = "default_minimum_borrow_usd_value")]
    pub minimum_borrow_usd_value: Decimal,

    /// Name of the module account holding deposits
    #[serde(default = "default_module_name")]
    pub module_name: String,
}

fn default_minimum_borrow_usd_value() -> Decimal {
    Decimal::new(10, 0)
}

fn default_module_name() -> String {
    "hard".to_string()
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            money_markets: Vec::new(),
            minimum_borrow_usd_value: default_minimum_borrow_usd_value(),
            module_name: default_module_name(),
        }
    }
}

impl MarketParams {
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

    pub fn validate(&self) -> MarketResult<()> {
        let mut seen = BTreeSet::new();
        for market in &self.money_markets {
            if !seen.insert(market.denom.as_str()) {
                return Err(MarketError::InvalidParams(format!(
                    "duplicate money market denom: {}",
                    market.denom
                )));
            }
            market.validate()?;
        }
        if self.minimum_borrow_usd_value.is_sign_negative() {
            return Err(MarketError::InvalidParams(
                "minimum borrow USD value must be non-negative".to_string(),
            ));
        }
        if self.module_name.trim().is_empty() {
            return Err(MarketError::InvalidParams("module name is blank".to_string()));
        }
        Ok(())
    }

    pub fn money_market(&self, denom: &str) -> Option<&MoneyMarket> {
        self.money_markets.iter().find(|m| m.denom == denom)
    }

    /// Market denoms in sorted order
    pub fn denoms(&self) -> Vec<String> {
        let mut denoms: Vec<String> = self.money_markets.iter().map(|m| m.denom.clone()).collect();
        denoms.sort();
        denoms
    }
}

fn unit_interval(value: Decimal) -> bool {
    !value.is_sign_negative() && value <= Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market(denom: &str) -> MoneyMarket {
        MoneyMarket {
            denom: denom.to_string(),
            borrow_limit: BorrowLimit {
                has_max_limit: false,
                maximum_limit: Decimal::ZERO,
                loan_to_value: dec!(0.6),
            },
            spot_market_id: format!("{}:usd", denom),
            conversion_factor: dec!(1000000),
            interest_rate_model: InterestRateModel {
                base_rate_apy: dec!(0.05),
                base_multiplier: dec!(2),
                kink: dec!(0.8),
                jump_multiplier: dec!(10),
            },
            reserve_factor: dec!(0.05),
            keeper_reward_percentage: dec!(0.02),
        }
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let params: MarketParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, MarketParams::default());
        assert_eq!(params.minimum_borrow_usd_value, dec!(10));
        assert_eq!(params.module_name, "hard");
    }

    #[test]
    fn test_duplicate_denoms_rejected() {
        let params = MarketParams {
            money_markets: vec![market("ukava"), market("ukava")],
            ..MarketParams::default()
        };
        assert!(matches!(params.validate(), Err(MarketError::InvalidParams(_))));
    }

    #[test]
    fn test_out_of_range_ratios_rejected() {
        let mut bad = market("ukava");
        bad.borrow_limit.loan_to_value = dec!(1.1);
        assert!(bad.validate().is_err());

        let mut bad = market("ukava");
        bad.interest_rate_model.kink = dec!(-0.1);
        assert!(bad.validate().is_err());

        let mut bad = market("ukava");
        bad.conversion_factor = Decimal::ZERO;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lookup_and_sorted_denoms() {
        let params = MarketParams {
            money_markets: vec![market("usdx"), market("bnb")],
            ..MarketParams::default()
        };
        assert!(params.validate().is_ok());
        assert!(params.money_market("bnb").is_some());
        assert_eq!(params.denoms(), vec!["bnb".to_string(), "usdx".to_string()]);
    }
}

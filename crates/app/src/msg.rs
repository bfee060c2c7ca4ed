//! Transaction messages and structural validation

use harbor_core::{validate_denom, Address, Coins};
use harbor_incentive::{ClaimType, IncentiveError, MultiplierName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// A denom to claim and the multiplier to claim it with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub denom: String,
    pub multiplier_name: String,
}

impl Selection {
    pub fn new(denom: impl Into<String>, multiplier_name: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            multiplier_name: multiplier_name.into(),
        }
    }

    pub fn multiplier(&self) -> Result<MultiplierName, IncentiveError> {
        self.multiplier_name
            .parse()
            .map_err(|_| IncentiveError::InvalidMultiplierName(self.multiplier_name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    Deposit {
        depositor: Address,
        amount: Coins,
    },
    Withdraw {
        depositor: Address,
        amount: Coins,
    },
    Borrow {
        borrower: Address,
        amount: Coins,
    },
    /// `sender` pays down the borrow of `owner`
    Repay {
        sender: Address,
        owner: Address,
        amount: Coins,
    },
    Liquidate {
        keeper: Address,
        borrower: Address,
    },
    ClaimReward {
        sender: Address,
        receiver: Address,
        claim_type: ClaimType,
        selections: Vec<Selection>,
    },
}

fn require_address(address: &Address, field: &str) -> AppResult<()> {
    if address.is_empty() {
        return Err(AppError::InvalidMessage(format!("{} address cannot be empty", field)));
    }
    Ok(())
}

fn require_coins(coins: &Coins) -> AppResult<()> {
    if coins.is_empty() {
        return Err(AppError::InvalidMessage("coins cannot be empty".to_string()));
    }
    for denom in coins.denoms() {
        validate_denom(denom)?;
    }
    Ok(())
}

impl Msg {
    /// The address that authorizes the message
    pub fn signer(&self) -> &Address {
        match self {
            Msg::Deposit { depositor, .. } | Msg::Withdraw { depositor, .. } => depositor,
            Msg::Borrow { borrower, .. } => borrower,
            Msg::Repay { sender, .. } => sender,
            Msg::Liquidate { keeper, .. } => keeper,
            Msg::ClaimReward { sender, .. } => sender,
        }
    }

    /// Checks that need no state
    pub fn validate_basic(&self) -> AppResult<()> {
        match self {
            Msg::Deposit { depositor, amount } | Msg::Withdraw { depositor, amount } => {
                require_address(depositor, "depositor")?;
                require_coins(amount)
            }
            Msg::Borrow { borrower, amount } => {
                require_address(borrower, "borrower")?;
                require_coins(amount)
            }
            Msg::Repay {
                sender,
                owner,
                amount,
            } => {
                require_address(sender, "sender")?;
                require_address(owner, "owner")?;
                require_coins(amount)
            }
            Msg::Liquidate { keeper, borrower } => {
                require_address(keeper, "keeper")?;
                require_address(borrower, "borrower")
            }
            Msg::ClaimReward {
                sender,
                receiver,
                selections,
                ..
            } => {
                require_address(sender, "sender")?;
                require_address(receiver, "receiver")?;
                if selections.is_empty() {
                    return Err(AppError::InvalidMessage(
                        "must claim at least one denom".to_string(),
                    ));
                }
                let mut seen = BTreeSet::new();
                for selection in selections {
                    validate_denom(&selection.denom)?;
                    selection.multiplier()?;
                    if !seen.insert(selection.denom.as_str()) {
                        return Err(AppError::InvalidMessage(format!(
                            "cannot claim denom {} more than once",
                            selection.denom
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

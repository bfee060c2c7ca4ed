//! Ledger mutation events - data passed to listeners

use harbor_core::{Address, Coins};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Share held per source id (a denom, the bond denom or a pool id)
pub type SourceShares = BTreeMap<String, Decimal>;

/// Shares for a deposit or borrow: one source per denom
pub fn shares_from_coins(coins: &Coins) -> SourceShares {
    coins
        .iter()
        .map(|(denom, amount)| (denom.to_string(), amount.value()))
        .collect()
}

/// The kind of position whose balance changes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Money market deposit, one source per deposited denom
    Deposit,
    /// Money market borrow, one source per borrowed denom
    Borrow,
    /// Staking delegation, a single source keyed by the bond denom
    Delegation,
    /// Liquidity pool shares, one source per pool id
    PoolShare,
}

/// Event dispatched around a balance-changing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Fired before the mutation with the shares the owner holds now
    BalanceWillChange {
        owner: Address,
        kind: PositionKind,
        shares: SourceShares,
    },

    /// Fired after the mutation with the shares held before and after
    BalanceDidChange {
        owner: Address,
        kind: PositionKind,
        before: SourceShares,
        after: SourceShares,
    },
}

impl LedgerEvent {
    pub fn will_change(owner: &Address, kind: PositionKind, shares: SourceShares) -> Self {
        LedgerEvent::BalanceWillChange {
            owner: owner.clone(),
            kind,
            shares,
        }
    }

    pub fn did_change(
        owner: &Address,
        kind: PositionKind,
        before: SourceShares,
        after: SourceShares,
    ) -> Self {
        LedgerEvent::BalanceDidChange {
            owner: owner.clone(),
            kind,
            before,
            after,
        }
    }

    pub fn owner(&self) -> &Address {
        match self {
            LedgerEvent::BalanceWillChange { owner, .. }
            | LedgerEvent::BalanceDidChange { owner, .. } => owner,
        }
    }

    pub fn kind(&self) -> PositionKind {
        match self {
            LedgerEvent::BalanceWillChange { kind, .. }
            | LedgerEvent::BalanceDidChange { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_core::Coin;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shares_from_coins() {
        let coins = Coins::from_coins([Coin::from_units("ukava", 10), Coin::from_units("usdx", 4)]);
        let shares = shares_from_coins(&coins);
        assert_eq!(shares.get("ukava"), Some(&dec!(10)));
        assert_eq!(shares.get("usdx"), Some(&dec!(4)));
    }

    #[test]
    fn test_position_kind_names() {
        assert_eq!(PositionKind::PoolShare.to_string(), "pool_share");
        assert_eq!("deposit".parse::<PositionKind>().unwrap(), PositionKind::Deposit);
    }

    #[test]
    fn test_event_accessors() {
        let owner = Address::new("kava1alice");
        let event = LedgerEvent::will_change(&owner, PositionKind::Borrow, SourceShares::new());
        assert_eq!(event.owner(), &owner);
        assert_eq!(event.kind(), PositionKind::Borrow);
    }
}

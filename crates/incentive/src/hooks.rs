//! Ledger listener that keeps claims in step with positions

use harbor_hooks::{HookError, HookResult, LedgerEvent, LedgerListener, PositionKind, SourceShares};
use rust_decimal::Decimal;
use tracing::trace;

use crate::claim::RewardCategory;
use crate::error::IncentiveError;
use crate::store::IncentiveStore;

const LISTENER_NAME: &str = "incentive";

/// Reward category earned by a kind of position
pub fn category_for(kind: PositionKind) -> RewardCategory {
    match kind {
        PositionKind::Deposit => RewardCategory::Supply,
        PositionKind::Borrow => RewardCategory::Borrow,
        PositionKind::Delegation => RewardCategory::Delegator,
        PositionKind::PoolShare => RewardCategory::Pool,
    }
}

/// Settles rewards before a position changes and snapshots indexes for
/// sources the owner newly enters.
pub struct RewardHooks<'a> {
    store: &'a mut IncentiveStore,
}

impl<'a> RewardHooks<'a> {
    pub fn new(store: &'a mut IncentiveStore) -> Self {
        Self { store }
    }

    fn handle(&mut self, event: &LedgerEvent) -> Result<(), IncentiveError> {
        match event {
            LedgerEvent::BalanceWillChange { owner, kind, shares } => {
                let category = category_for(*kind);
                if self.store.claim(category.claim_type(), owner).is_none() {
                    return Ok(());
                }
                for (source, amount) in shares {
                    self.store
                        .synchronize_claim(category, source, owner, *amount)?;
                }
            }
            LedgerEvent::BalanceDidChange {
                owner,
                kind,
                before,
                after,
            } => {
                let category = category_for(*kind);
                for (source, amount) in after {
                    if amount.is_zero() || held(before, source) {
                        continue;
                    }
                    self.store.initialize_claim(category, source, owner);
                }
                let claim_type = category.claim_type();
                if let Some(mut claim) = self.store.claim(claim_type, owner).cloned() {
                    let mut changed = false;
                    for source in before.keys().filter(|s| !after.contains_key(*s)) {
                        claim.remove_source(category, source);
                        changed = true;
                    }
                    if changed {
                        self.store.set_claim(claim);
                    }
                }
            }
        }
        Ok(())
    }
}

fn held(shares: &SourceShares, source: &str) -> bool {
    shares.get(source).is_some_and(|s| *s > Decimal::ZERO)
}

impl LedgerListener for RewardHooks<'_> {
    fn name(&self) -> &str {
        LISTENER_NAME
    }

    fn on_event(&mut self, event: &LedgerEvent) -> HookResult<()> {
        trace!(owner = %event.owner(), kind = %event.kind(), "incentive hook");
        self.handle(event).map_err(|e| {
            if e.is_fatal() {
                HookError::fatal(LISTENER_NAME, e.to_string())
            } else {
                HookError::listener(LISTENER_NAME, e.to_string())
            }
        })
    }
}

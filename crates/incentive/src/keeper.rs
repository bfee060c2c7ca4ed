//! Reward keeper
//!
//! Accumulates global reward indexes at the start of each block and pays
//! out claims. Source totals and owner shares come in through
//! `RewardSources`; payouts go out through the account and bank contracts.

use harbor_accounts::{send_time_locked_coins, AccountKeeper, BankKeeper};
use harbor_core::{Address, Amount, BlockContext, Coin, Coins};
use harbor_events::{EventKind, EventLog, ModuleEvent};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::accumulator::Accumulator;
use crate::claim::{Claim, ClaimType, RewardCategory};
use crate::error::{IncentiveError, IncentiveResult};
use crate::params::{IncentiveParams, MultiRewardPeriod, MultiplierName};
use crate::payout::period_length;
use crate::sources::RewardSources;
use crate::store::IncentiveStore;

pub struct RewardKeeper<'a> {
    ctx: BlockContext,
    params: &'a IncentiveParams,
    store: &'a mut IncentiveStore,
    events: &'a mut EventLog,
}

impl<'a> RewardKeeper<'a> {
    pub fn new(
        ctx: BlockContext,
        params: &'a IncentiveParams,
        store: &'a mut IncentiveStore,
        events: &'a mut EventLog,
    ) -> Self {
        Self {
            ctx,
            params,
            store,
            events,
        }
    }

    pub fn store(&self) -> &IncentiveStore {
        self.store
    }

    /// Grow the global indexes of one source up to the block time.
    ///
    /// A source accumulated for the first time starts at the block time and
    /// earns nothing in that block.
    pub fn accumulate_rewards(
        &mut self,
        category: RewardCategory,
        period: &MultiRewardPeriod,
        source_total: Decimal,
    ) -> IncentiveResult<()> {
        let source = period.collateral_type.as_str();
        let previous = self
            .store
            .accrual_time(category, source)
            .unwrap_or(self.ctx.time);
        let indexes = self
            .store
            .global_indexes(category, source)
            .cloned()
            .unwrap_or_default();

        let mut acc = Accumulator::new(previous, indexes);
        acc.accumulate(period, source_total, self.ctx.time)?;

        self.store
            .set_accrual_time(category, source, acc.previous_accumulation_time);
        if !acc.indexes.is_empty() {
            self.store
                .set_global_indexes(category, source, acc.indexes.clone());
        }

        debug!(
            %category,
            source,
            %source_total,
            indexes = %acc.indexes,
            "Rewards accumulated"
        );
        self.events.emit(
            ModuleEvent::new(EventKind::RewardsAccumulated)
                .with("category", category)
                .with("source", source)
                .with("indexes", &acc.indexes),
        );
        Ok(())
    }

    /// Accumulate every active reward period: supply, borrow, delegator,
    /// then pool rewards.
    pub fn accumulate_all(&mut self, sources: &dyn RewardSources) -> IncentiveResult<()> {
        let params = self.params;
        for category in RewardCategory::ALL {
            for period in params.periods(category).iter().filter(|p| p.active) {
                let total = sources.source_total(category, &period.collateral_type);
                self.accumulate_rewards(category, period, total)?;
            }
        }
        Ok(())
    }

    /// The owner's claim with every source settled against the current
    /// global indexes. Does not write to the store.
    pub fn synchronized_claim(
        &self,
        claim_type: ClaimType,
        owner: &Address,
        sources: &dyn RewardSources,
    ) -> IncentiveResult<Option<Claim>> {
        let Some(mut claim) = self.store.claim(claim_type, owner).cloned() else {
            return Ok(None);
        };
        for &category in claim_type.categories() {
            let candidates: BTreeSet<String> = claim
                .sources(category)
                .into_iter()
                .chain(self.store.sources(category))
                .collect();
            for source in candidates {
                let shares = sources.owner_shares(category, owner, &source);
                if shares.is_zero() && claim.source_indexes(category, &source).is_none() {
                    continue;
                }
                let global = self.store.global_indexes(category, &source);
                claim.synchronize(category, &source, global, shares)?;
            }
        }
        Ok(Some(claim))
    }

    /// Pay out the owner's rewards in `denom` to `receiver`.
    ///
    /// The payout is the earned amount scaled by the chosen multiplier,
    /// rounded down, and locked for the multiplier's lockup. The whole
    /// earned amount leaves the claim.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_reward<K>(
        &mut self,
        claim_type: ClaimType,
        owner: &Address,
        receiver: &Address,
        denom: &str,
        multiplier_name: MultiplierName,
        sources: &dyn RewardSources,
        bank: &mut K,
    ) -> IncentiveResult<Coins>
    where
        K: AccountKeeper + BankKeeper + ?Sized,
    {
        let multiplier = self
            .params
            .multiplier(denom, multiplier_name)
            .ok_or_else(|| IncentiveError::InvalidMultiplier {
                denom: denom.to_string(),
                name: multiplier_name,
            })?;

        let now = self.ctx.time;
        if now > self.params.claim_end {
            return Err(IncentiveError::ClaimExpired {
                now,
                claim_end: self.params.claim_end,
            });
        }

        let mut claim = self
            .synchronized_claim(claim_type, owner, sources)?
            .ok_or_else(|| IncentiveError::ClaimNotFound {
                claim_type,
                owner: owner.clone(),
            })?;

        let earned = claim.reward.amount_of(denom);
        let payout = Amount::truncate(earned.value() * multiplier.factor)?;
        if payout.is_zero() {
            return Err(IncentiveError::ZeroClaim);
        }
        let payout_coins = Coins::from(Coin::new(denom, payout));

        let length = period_length(now, multiplier.months_lockup)?;
        let funding = Address::module(&self.params.funding_module);
        send_time_locked_coins(bank, now, &funding, receiver, &payout_coins, length)?;

        claim.reward = claim.reward.saturating_sub(&Coins::from(Coin::new(denom, earned)));
        self.store.set_claim(claim);

        info!(
            owner = %owner,
            receiver = %receiver,
            %claim_type,
            payout = %payout_coins,
            length,
            "Reward claimed"
        );
        self.events.emit(
            ModuleEvent::new(EventKind::ClaimReward)
                .with("claimed_by", owner)
                .with("claim_amount", &payout_coins)
                .with("claim_type", claim_type),
        );
        Ok(payout_coins)
    }
}

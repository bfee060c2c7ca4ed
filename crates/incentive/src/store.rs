//! Incentive state: claims, global indexes and accrual times

use chrono::{DateTime, Utc};
use harbor_core::{unique, Address};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::claim::{Claim, ClaimType, RewardCategory};
use crate::error::IncentiveResult;
use crate::indexes::RewardIndexes;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveStore {
    #[serde(default, deserialize_with = "unique::map")]
    pub hard_claims: BTreeMap<Address, Claim>,
    #[serde(default, deserialize_with = "unique::map")]
    pub swap_claims: BTreeMap<Address, Claim>,
    /// Global reward indexes per category and source
    #[serde(default, deserialize_with = "unique::nested_map")]
    pub indexes: BTreeMap<RewardCategory, BTreeMap<String, RewardIndexes>>,
    /// Last accumulation time per category and source
    #[serde(default, deserialize_with = "unique::nested_map")]
    pub accrual_times: BTreeMap<RewardCategory, BTreeMap<String, DateTime<Utc>>>,
}

impl IncentiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claims_mut(&mut self, claim_type: ClaimType) -> &mut BTreeMap<Address, Claim> {
        match claim_type {
            ClaimType::Hard => &mut self.hard_claims,
            ClaimType::Swap => &mut self.swap_claims,
        }
    }

    pub fn claims(&self, claim_type: ClaimType) -> &BTreeMap<Address, Claim> {
        match claim_type {
            ClaimType::Hard => &self.hard_claims,
            ClaimType::Swap => &self.swap_claims,
        }
    }

    pub fn claim(&self, claim_type: ClaimType, owner: &Address) -> Option<&Claim> {
        self.claims(claim_type).get(owner)
    }

    pub fn set_claim(&mut self, claim: Claim) {
        let owner = claim.owner.clone();
        self.claims_mut(claim.claim_type).insert(owner, claim);
    }

    pub fn global_indexes(&self, category: RewardCategory, source_id: &str) -> Option<&RewardIndexes> {
        self.indexes.get(&category).and_then(|m| m.get(source_id))
    }

    pub fn set_global_indexes(
        &mut self,
        category: RewardCategory,
        source_id: &str,
        indexes: RewardIndexes,
    ) {
        self.indexes
            .entry(category)
            .or_default()
            .insert(source_id.to_string(), indexes);
    }

    pub fn accrual_time(&self, category: RewardCategory, source_id: &str) -> Option<DateTime<Utc>> {
        self.accrual_times
            .get(&category)
            .and_then(|m| m.get(source_id))
            .copied()
    }

    pub fn set_accrual_time(&mut self, category: RewardCategory, source_id: &str, time: DateTime<Utc>) {
        self.accrual_times
            .entry(category)
            .or_default()
            .insert(source_id.to_string(), time);
    }

    /// Sources with global indexes in `category`
    pub fn sources(&self, category: RewardCategory) -> Vec<String> {
        self.indexes
            .get(&category)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make sure `owner` has a claim and a snapshot for `source_id`.
    ///
    /// The snapshot starts at the current global indexes, or empty when the
    /// source has none yet, so only rewards accrued from now on are earned.
    pub fn initialize_claim(&mut self, category: RewardCategory, source_id: &str, owner: &Address) {
        let snapshot = self
            .global_indexes(category, source_id)
            .cloned()
            .unwrap_or_default();
        let claim_type = category.claim_type();
        let claim = self
            .claims_mut(claim_type)
            .entry(owner.clone())
            .or_insert_with(|| Claim::new(claim_type, owner.clone()));
        claim.set_source_indexes(category, source_id, snapshot);
    }

    /// Settle rewards earned by `shares` of `source_id` into the owner's
    /// claim. Owners without a claim are skipped.
    pub fn synchronize_claim(
        &mut self,
        category: RewardCategory,
        source_id: &str,
        owner: &Address,
        shares: Decimal,
    ) -> IncentiveResult<()> {
        let global = self.global_indexes(category, source_id).cloned();
        let claims = self.claims_mut(category.claim_type());
        if let Some(claim) = claims.get_mut(owner) {
            claim.synchronize(category, source_id, global.as_ref(), shares)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        for claim in self.hard_claims.values().chain(self.swap_claims.values()) {
            claim.validate()?;
        }
        for sources in self.indexes.values() {
            for indexes in sources.values() {
                indexes.validate()?;
            }
        }
        Ok(())
    }
}

//! CLI commands

use anyhow::Context;
use chrono::{DateTime, Utc};
use harbor_core::{Address, BlockContext};
use harbor_events::EventReader;
use harbor_incentive::{BondStatus, ClaimType, MockPools, MockStaking, PoolShareSource, StakingKeeper};
use harbor_market::MockAuctionHouse;
use harbor_oracle::MockPriceFeed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::app::{App, Collaborators};
use crate::config::AppConfig;
use crate::genesis::GenesisState;
use crate::msg::Msg;
use crate::query::Page;

/// Tokens bonded to a validator during a scripted block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDelegation {
    pub delegator: Address,
    pub validator: String,
    pub amount: Decimal,
}

/// Pool shares set for an owner during a scripted block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedPoolDeposit {
    pub owner: Address,
    pub pool_id: String,
    pub shares: Decimal,
}

/// One block of a replay script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedBlock {
    pub height: u64,
    pub time: DateTime<Utc>,
    /// Prices set before the block begins, by market id
    #[serde(default)]
    pub prices: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub delegations: Vec<ScriptedDelegation>,
    #[serde(default)]
    pub pool_deposits: Vec<ScriptedPoolDeposit>,
    #[serde(default)]
    pub msgs: Vec<Msg>,
}

/// Outcome of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub blocks: usize,
    pub delivered: usize,
    pub rejected: usize,
}

/// In-memory collaborators whose handles stay with the replay driver
pub struct MockHandles {
    pub prices: Arc<MockPriceFeed>,
    pub staking: Arc<MockStaking>,
    pub pools: Arc<MockPools>,
}

impl MockHandles {
    pub fn new() -> Self {
        Self {
            prices: Arc::new(MockPriceFeed::new()),
            staking: Arc::new(MockStaking::new()),
            pools: Arc::new(MockPools::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            prices: self.prices.clone(),
            auctions: Box::new(MockAuctionHouse::new()),
            staking: self.staking.clone(),
            pools: self.pools.clone(),
        }
    }
}

impl Default for MockHandles {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a replay script: a JSON array of blocks
pub fn load_blocks(path: &Path) -> Result<Vec<ScriptedBlock>, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading block script {}", path.display()))?;
    let blocks = serde_json::from_str(&content)
        .with_context(|| format!("parsing block script {}", path.display()))?;
    Ok(blocks)
}

/// Run scripted blocks. A rejected message is reported and skipped; a fatal
/// error stops the replay.
pub fn run_blocks(
    app: &mut App,
    handles: &MockHandles,
    blocks: &[ScriptedBlock],
) -> Result<ReplaySummary, anyhow::Error> {
    let mut summary = ReplaySummary::default();
    for block in blocks {
        for (market_id, price) in &block.prices {
            handles.prices.set_price(market_id, *price);
        }
        app.begin_block(BlockContext::new(block.height, block.time))?;

        for delegation in &block.delegations {
            if handles.staking.validator(&delegation.validator).is_none() {
                handles.staking.add_validator(
                    &delegation.validator,
                    BondStatus::Bonded,
                    Decimal::ZERO,
                    Decimal::ZERO,
                );
            }
            let is_new = !handles
                .staking
                .delegator_delegations(&delegation.delegator)
                .iter()
                .any(|d| d.validator == delegation.validator);
            app.before_delegation_changed(&delegation.delegator)?;
            handles
                .staking
                .delegate(&delegation.delegator, &delegation.validator, delegation.amount);
            if is_new {
                app.after_delegation_created(&delegation.delegator)?;
            }
        }

        for deposit in &block.pool_deposits {
            let is_new = handles
                .pools
                .shares_of(&deposit.pool_id, &deposit.owner)
                .is_none();
            app.before_pool_deposit_changed(&deposit.owner, &deposit.pool_id)?;
            handles
                .pools
                .set_shares(&deposit.pool_id, &deposit.owner, deposit.shares);
            if is_new {
                app.after_pool_deposit_created(&deposit.owner, &deposit.pool_id)?;
            }
        }

        for msg in &block.msgs {
            match app.deliver(msg) {
                Ok(_) => summary.delivered += 1,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(height = block.height, signer = %msg.signer(), error = %e, "Message rejected");
                    println!("❌ Block {}: {} rejected: {}", block.height, msg.signer(), e);
                    summary.rejected += 1;
                }
            }
        }
        summary.blocks += 1;
    }
    Ok(summary)
}

/// Validate a genesis file
pub fn validate_genesis(path: &Path) -> Result<(), anyhow::Error> {
    let genesis = GenesisState::from_json_file(path)?;
    genesis.validate()?;
    println!(
        "✅ Genesis valid: {} markets, {} deposits, {} borrows",
        genesis.market.params.money_markets.len(),
        genesis.market.state.deposits.len(),
        genesis.market.state.borrows.len()
    );
    Ok(())
}

/// Import a genesis, replay a block script and optionally export the
/// resulting state
pub fn replay(
    config: AppConfig,
    genesis: &Path,
    blocks: &Path,
    export: Option<&Path>,
) -> Result<App, anyhow::Error> {
    let handles = MockHandles::new();
    let mut app = App::new(config, handles.collaborators())?;
    app.init_genesis(GenesisState::from_json_file(genesis)?)?;

    let blocks = load_blocks(blocks)?;
    let summary = run_blocks(&mut app, &handles, &blocks)?;
    println!(
        "✅ Replayed {} blocks: {} messages delivered, {} rejected",
        summary.blocks, summary.delivered, summary.rejected
    );

    if let Some(path) = export {
        let json = serde_json::to_string_pretty(&app.export_genesis())?;
        std::fs::write(path, json)?;
        println!("   State exported to {}", path.display());
    }
    Ok(app)
}

/// Print a summary of a JSONL event store
pub fn events(dir: &Path, kind: Option<&str>) -> Result<(), anyhow::Error> {
    let reader = EventReader::from_directory(dir)?;
    let records = reader.read_all()?;
    let mut count = 0;
    for record in &records {
        if kind.map_or(true, |k| record.event.kind.to_string() == k) {
            println!("{}", serde_json::to_string(record)?);
            count += 1;
        }
    }
    match reader.last_height()? {
        Some(height) => println!("✅ {} events, last height {}", count, height),
        None => println!("✅ No events"),
    }
    Ok(())
}

/// Print positions, claims and market figures of a genesis file as JSON
pub fn show(genesis: &Path, owner: Option<&str>, page: Page) -> Result<(), anyhow::Error> {
    let mut app = App::new(AppConfig::default(), Collaborators::mock())?;
    app.init_genesis(GenesisState::from_json_file(genesis)?)?;
    let owner = owner.map(Address::new);
    let owner = owner.as_ref();

    let view = serde_json::json!({
        "deposits": app.deposits(owner, None, page),
        "borrows": app.borrows(owner, None, page),
        "hard_claims": app.claims(ClaimType::Hard, owner, page),
        "swap_claims": app.claims(ClaimType::Swap, owner, page),
        "total_deposited": app.total_deposited(None),
        "total_borrowed": app.total_borrowed(None),
        "total_reserves": app.total_reserves(None),
        "interest_rates": app.interest_rates(None),
        "interest_factors": app.interest_factors(None),
        "reward_factors": app.reward_factors(None),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

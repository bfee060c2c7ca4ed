//! Integration tests for the application: atomic delivery, block lifecycle,
//! hooks from external modules, events and genesis

use chrono::{DateTime, Duration, TimeZone, Utc};
use harbor_accounts::{Bank, BankKeeper};
use harbor_app::commands::MockHandles;
use harbor_app::{App, AppConfig, AppError, GenesisState, IncentiveGenesis, MarketGenesis, Msg, Page, Selection};
use harbor_core::{Address, BlockContext, Coin, Coins};
use harbor_events::{EventKind, EventReader};
use harbor_incentive::{
    BondStatus, ClaimType, IncentiveError, IncentiveParams, MultiRewardPeriod, Multiplier,
    MultiplierName, MultipliersPerDenom,
};
use harbor_market::{BorrowLimit, InterestRateModel, MarketError, MarketParams, MoneyMarket};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
}

fn coins(denom: &str, units: u64) -> Coins {
    Coins::from(Coin::from_units(denom, units))
}

fn alice() -> Address {
    Address::new("kava1alice")
}

fn bob() -> Address {
    Address::new("kava1bob")
}

fn market(denom: &str, spot: &str) -> MoneyMarket {
    MoneyMarket {
        denom: denom.to_string(),
        borrow_limit: BorrowLimit {
            has_max_limit: false,
            maximum_limit: Decimal::ZERO,
            loan_to_value: dec!(0.6),
        },
        spot_market_id: spot.to_string(),
        conversion_factor: dec!(1000000),
        interest_rate_model: InterestRateModel {
            base_rate_apy: dec!(0.05),
            base_multiplier: dec!(0.1),
            kink: dec!(0.8),
            jump_multiplier: dec!(1),
        },
        reserve_factor: dec!(0.05),
        keeper_reward_percentage: dec!(0.05),
    }
}

fn genesis() -> GenesisState {
    let year = t0() + Duration::days(365);
    let mut accounts = Bank::new();
    let funding = accounts.register_module("incentive");
    accounts.mint(&funding, &coins("hard", 1_000_000_000));
    for user in [alice(), bob()] {
        accounts.mint(&user, &coins("ukava", 100_000_000));
        accounts.mint(&user, &coins("usdx", 100_000_000));
    }

    GenesisState {
        genesis_time: t0(),
        market: MarketGenesis {
            params: MarketParams {
                money_markets: vec![market("ukava", "kava:usd"), market("usdx", "usdx:usd")],
                ..MarketParams::default()
            },
            state: Default::default(),
        },
        incentive: IncentiveGenesis {
            params: IncentiveParams {
                supply_reward_periods: vec![MultiRewardPeriod::new("ukava", t0(), year, coins("hard", 100))],
                delegator_reward_periods: vec![MultiRewardPeriod::new("ukava", t0(), year, coins("hard", 50))],
                claim_multipliers: vec![MultipliersPerDenom {
                    denom: "hard".to_string(),
                    multipliers: vec![
                        Multiplier::new(MultiplierName::Small, 0, dec!(0.2)),
                        Multiplier::new(MultiplierName::Large, 12, dec!(1.0)),
                    ],
                }],
                claim_end: t0() + Duration::days(730),
                ..IncentiveParams::default()
            },
            state: Default::default(),
        },
        accounts,
    }
}

fn setup(config: AppConfig) -> (App, MockHandles) {
    let handles = MockHandles::new();
    handles.prices.set_price("kava:usd", dec!(2));
    handles.prices.set_price("usdx:usd", dec!(1));
    let mut app = App::new(config, handles.collaborators()).unwrap();
    app.init_genesis(genesis()).unwrap();
    (app, handles)
}

fn at(height: u64, seconds: i64) -> BlockContext {
    BlockContext::new(height, t0() + Duration::seconds(seconds))
}

fn deposit(depositor: Address, denom: &str, units: u64) -> Msg {
    Msg::Deposit {
        depositor,
        amount: coins(denom, units),
    }
}

fn claim_hard(multiplier: &str) -> Msg {
    Msg::ClaimReward {
        sender: alice(),
        receiver: alice(),
        claim_type: ClaimType::Hard,
        selections: vec![Selection::new("hard", multiplier)],
    }
}

#[test]
fn test_deposit_and_borrow_through_deliver() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(bob(), "usdx", 50_000_000)).unwrap();
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();

    let events = app
        .deliver(&Msg::Borrow {
            borrower: alice(),
            amount: coins("usdx", 10_000_000),
        })
        .unwrap();
    assert!(events.iter().any(|e| e.kind == EventKind::HardBorrow));

    assert_eq!(app.total_borrowed(None), coins("usdx", 10_000_000));
    assert_eq!(app.total_deposited(Some("ukava")), coins("ukava", 10_000_000));
    assert_eq!(app.module_balances(), coins("usdx", 40_000_000).add(&coins("ukava", 10_000_000)));
    assert_eq!(app.state().bank.balance(&alice(), "usdx").value(), dec!(110000000));
    assert_eq!(app.borrows(Some(&alice()), None, Page::default()).len(), 1);
}

#[test]
fn test_failed_message_leaves_state_untouched() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(bob(), "usdx", 50_000_000)).unwrap();
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();
    let before = app.state().clone();

    // $20 of collateral at 0.6 allows $12
    let err = app
        .deliver(&Msg::Borrow {
            borrower: alice(),
            amount: coins("usdx", 20_000_000),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Market(MarketError::InsufficientLoanToValue { .. })));
    assert_eq!(app.state(), &before);
    assert!(!app.is_halted());
}

#[test]
fn test_structurally_invalid_message_rejected() {
    let (mut app, _handles) = setup(AppConfig::default());
    let err = app.deliver(&deposit(alice(), "ukava", 0)).unwrap_err();
    assert!(matches!(err, AppError::InvalidMessage(_)));
}

#[test]
fn test_begin_block_accrues_interest() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(bob(), "usdx", 50_000_000)).unwrap();
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();
    app.deliver(&Msg::Borrow {
        borrower: alice(),
        amount: coins("usdx", 10_000_000),
    })
    .unwrap();

    let events = app.begin_block(at(1, 31_536_000)).unwrap();
    assert!(events.iter().any(|e| e.kind == EventKind::InterestAccrued));

    // utilization 0.2 → 7% borrow APY over one year
    assert_eq!(app.total_borrowed(Some("usdx")), coins("usdx", 10_700_000));
    let factors = app.interest_factors(Some("usdx"));
    assert_eq!(factors.len(), 1);
    assert!(factors[0].borrow_interest_factor > Decimal::ONE);

    let synced = app.synced_borrows(Some(&alice()), None, Page::default()).unwrap();
    assert_eq!(synced[0].amount, coins("usdx", 10_700_000));
    // stored borrow is only synced by the next position change
    assert_eq!(
        app.borrows(Some(&alice()), None, Page::default())[0].amount,
        coins("usdx", 10_000_000)
    );
}

#[test]
fn test_supply_rewards_claimed_through_deliver() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();

    // 100 hard/s over 10s shared by 10_000_000 ukava
    app.begin_block(at(1, 10)).unwrap();
    let synced = app
        .synced_claims(ClaimType::Hard, Some(&alice()), Page::default())
        .unwrap();
    assert_eq!(synced[0].reward, coins("hard", 1000));
    assert!(app.claims(ClaimType::Hard, Some(&alice()), Page::default())[0]
        .reward
        .is_empty());

    let events = app.deliver(&claim_hard("small")).unwrap();
    assert!(events.iter().any(|e| e.kind == EventKind::ClaimReward));
    assert_eq!(app.state().bank.balance(&alice(), "hard").value(), dec!(200));

    let err = app.deliver(&claim_hard("small")).unwrap_err();
    assert!(matches!(err, AppError::Incentive(IncentiveError::ZeroClaim)));
}

#[test]
fn test_claim_with_failing_selection_is_atomic() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();
    app.begin_block(at(1, 10)).unwrap();

    // ukava has no multipliers, so the second selection fails
    let msg = Msg::ClaimReward {
        sender: alice(),
        receiver: alice(),
        claim_type: ClaimType::Hard,
        selections: vec![Selection::new("hard", "small"), Selection::new("ukava", "small")],
    };
    let err = app.deliver(&msg).unwrap_err();
    assert!(matches!(err, AppError::Incentive(IncentiveError::InvalidMultiplier { .. })));
    assert!(app.state().bank.balance(&alice(), "hard").is_zero());

    app.deliver(&claim_hard("small")).unwrap();
    assert_eq!(app.state().bank.balance(&alice(), "hard").value(), dec!(200));
}

#[test]
fn test_delegation_hooks_earn_delegator_rewards() {
    let (mut app, handles) = setup(AppConfig::default());
    handles
        .staking
        .add_validator("kavavaloper1", BondStatus::Bonded, Decimal::ZERO, Decimal::ZERO);

    app.before_delegation_changed(&alice()).unwrap();
    handles.staking.delegate(&alice(), "kavavaloper1", dec!(1000));
    app.after_delegation_created(&alice()).unwrap();

    // 50 hard/s over 10s shared by 1000 bonded tokens
    app.begin_block(at(1, 10)).unwrap();
    app.deliver(&claim_hard("large")).unwrap();

    let now = app.context().time;
    assert_eq!(app.state().bank.balance(&alice(), "hard").value(), dec!(500));
    assert!(app
        .state()
        .bank
        .spendable_coins(&alice(), now)
        .amount_of("hard")
        .is_zero());
}

#[test]
fn test_params_update_requires_authority() {
    let (mut app, _handles) = setup(AppConfig::default());
    let params = IncentiveParams {
        claim_end: t0() + Duration::days(1),
        ..app.incentive_params().clone()
    };

    let err = app.update_incentive_params(&alice(), params.clone()).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized { .. }));

    let gov = app.config().authority.clone();
    app.update_incentive_params(&gov, params).unwrap();
    assert_eq!(app.incentive_params().claim_end, t0() + Duration::days(1));

    let invalid = MarketParams {
        money_markets: vec![market("usdx", "usdx:usd"), market("usdx", "usdx:usd")],
        ..MarketParams::default()
    };
    let err = app.update_market_params(&gov, invalid).unwrap_err();
    assert!(matches!(err, AppError::Market(MarketError::InvalidParams(_))));
}

#[test]
fn test_time_moving_backward_halts() {
    let (mut app, _handles) = setup(AppConfig::default());
    app.begin_block(at(1, 100)).unwrap();

    let err = app.begin_block(at(2, 50)).unwrap_err();
    assert!(err.is_fatal());
    assert!(app.is_halted());
    assert_eq!(app.context().height, 1);

    let err = app.deliver(&deposit(alice(), "ukava", 1_000_000)).unwrap_err();
    assert!(matches!(err, AppError::Halted));
    let err = app.begin_block(at(3, 200)).unwrap_err();
    assert!(matches!(err, AppError::Halted));
}

#[test]
fn test_committed_events_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        event_store_path: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };
    let (mut app, _handles) = setup(config);

    app.begin_block(at(1, 5)).unwrap();
    app.deliver(&deposit(alice(), "ukava", 10_000_000)).unwrap();
    let persisted = EventReader::from_directory(dir.path()).unwrap().count().unwrap();

    // a rejected message writes nothing
    app.deliver(&deposit(alice(), "ukava", 500_000_000)).unwrap_err();

    let reader = EventReader::from_directory(dir.path()).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), persisted);
    let deposit_record = records
        .iter()
        .find(|r| r.event.kind == EventKind::HardDeposit)
        .unwrap();
    assert_eq!(deposit_record.height, 1);
    assert_eq!(deposit_record.event.attribute("depositor"), Some("kava1alice"));
    assert_eq!(reader.last_height().unwrap(), Some(1));
}

#[test]
fn test_genesis_export_round_trip() -> anyhow::Result<()> {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(alice(), "ukava", 10_000_000))?;
    app.begin_block(at(1, 10))?;

    let exported = app.export_genesis();
    let json = serde_json::to_string(&exported)?;
    let imported: GenesisState = serde_json::from_str(&json)?;
    assert_eq!(imported, exported);

    let handles = MockHandles::new();
    let mut restored = App::new(AppConfig::default(), handles.collaborators())?;
    restored.init_genesis(imported)?;
    assert_eq!(restored.state(), app.state());
    assert_eq!(restored.context().time, t0() + Duration::seconds(10));
    Ok(())
}

#[test]
fn test_genesis_rejects_duplicate_reward_periods() {
    let mut genesis = genesis();
    let period = genesis.incentive.params.supply_reward_periods[0].clone();
    genesis.incentive.params.supply_reward_periods.push(period);

    let handles = MockHandles::new();
    let mut app = App::new(AppConfig::default(), handles.collaborators()).unwrap();
    let err = app.init_genesis(genesis).unwrap_err();
    assert!(matches!(err, AppError::Incentive(IncentiveError::InvalidParams(_))));
}

#[test]
fn test_genesis_file_with_repeated_key_rejected() -> anyhow::Result<()> {
    let (mut app, _handles) = setup(AppConfig::default());
    app.deliver(&deposit(alice(), "ukava", 10_000_000))?;
    app.begin_block(at(1, 10))?;

    let json = serde_json::to_string(&app.export_genesis())?;
    assert!(json.contains(r#""accrual_times":{"ukava":"#));
    let repeated = json.replacen(
        r#""accrual_times":{"#,
        r#""accrual_times":{"ukava":"2020-01-01T00:00:00Z","#,
        1,
    );

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("genesis.json");
    std::fs::write(&path, repeated)?;
    let err = GenesisState::from_json_file(&path).unwrap_err();
    assert!(matches!(&err, AppError::InvalidGenesis(msg) if msg.contains("duplicate key ukava")));

    std::fs::write(&path, json)?;
    assert!(GenesisState::from_json_file(&path).is_ok());
    Ok(())
}

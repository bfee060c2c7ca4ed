//! Integration tests for time-locked transfers

use chrono::{DateTime, Duration, TimeZone, Utc};
use harbor_accounts::{
    send_time_locked_coins, Account, AccountError, AccountKeeper, Bank, BankKeeper,
};
use harbor_core::{Address, Coin, Coins};

fn hard(units: u64) -> Coins {
    Coins::from(Coin::from_units("hard", units))
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap()
}

fn setup() -> (Bank, Address, Address) {
    let mut bank = Bank::new();
    let module = bank.register_module("incentive");
    bank.mint(&module, &hard(1_000));
    let user = Address::new("kava1user");
    bank.set_account(Account::plain(user.clone()));
    (bank, module, user)
}

#[test]
fn test_zero_length_is_plain_transfer() {
    let (mut bank, module, user) = setup();
    send_time_locked_coins(&mut bank, now(), &module, &user, &hard(100), 0).unwrap();

    assert_eq!(bank.spendable_coins(&user, now()), hard(100));
    assert!(matches!(bank.get_account(&user), Some(Account::Plain(_))));
}

#[test]
fn test_plain_receiver_is_promoted() {
    let (mut bank, module, user) = setup();
    send_time_locked_coins(&mut bank, now(), &module, &user, &hard(100), 3_600).unwrap();

    assert_eq!(bank.balances(&user), hard(100));
    assert!(bank.spendable_coins(&user, now()).is_empty());
    assert_eq!(
        bank.spendable_coins(&user, now() + Duration::seconds(3_600)),
        hard(100)
    );
    match bank.get_account(&user) {
        Some(Account::Vesting(v)) => assert!(v.validate().is_ok()),
        other => panic!("expected vesting account, got {:?}", other),
    }
}

#[test]
fn test_second_lock_splices_schedule() {
    let (mut bank, module, user) = setup();
    send_time_locked_coins(&mut bank, now(), &module, &user, &hard(100), 3_600).unwrap();
    let later = now() + Duration::seconds(600);
    send_time_locked_coins(&mut bank, later, &module, &user, &hard(50), 600).unwrap();

    let Some(Account::Vesting(v)) = bank.get_account(&user) else {
        panic!("expected vesting account");
    };
    assert_eq!(v.original_vesting, hard(150));
    assert_eq!(v.periods.len(), 2);
    assert!(v.validate().is_ok());
    assert_eq!(
        bank.spendable_coins(&user, later + Duration::seconds(600)),
        hard(50)
    );
}

#[test]
fn test_missing_receiver() {
    let (mut bank, module, _) = setup();
    let stranger = Address::new("kava1stranger");
    let result = send_time_locked_coins(&mut bank, now(), &module, &stranger, &hard(1), 10);
    assert!(matches!(result, Err(AccountError::AccountNotFound(_))));
}

#[test]
fn test_module_receiver_rejected() {
    let (mut bank, module, _) = setup();
    let other = bank.register_module("hard");
    let result = send_time_locked_coins(&mut bank, now(), &module, &other, &hard(1), 10);
    assert!(matches!(result, Err(AccountError::InvalidAccountType { .. })));
}

#[test]
fn test_insufficient_module_balance() {
    let (mut bank, module, user) = setup();
    let result = send_time_locked_coins(&mut bank, now(), &module, &user, &hard(5_000), 10);
    assert!(matches!(
        result,
        Err(AccountError::InsufficientModuleAccountBalance { .. })
    ));
    assert_eq!(bank.balances(&module), hard(1_000));
}

//! Keeper liquidations
//!
//! A position whose borrow exceeds its loan-to-value capacity can be closed
//! by any keeper. The keeper receives a share of every collateral coin; the
//! rest of the collateral is split into auction lots, one per (borrow denom,
//! collateral denom) pair, sized by USD value so that the lots together cover
//! the debt at the position's loan-to-value ratio. Lot dust goes back to the
//! borrower. Liquidation always closes the whole position.

use harbor_core::{Address, Amount, Coin, Coins};
use harbor_events::{EventKind, ModuleEvent};
use harbor_hooks::PositionKind;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::auction::{AuctionKeeper, LotReturn, AUCTION_MODULE_NAME};
use crate::error::{MarketError, MarketResult};
use crate::keeper::{MoneyMarketKeeper, Valuation};

/// Weight of the borrower's claim on leftover lot proceeds
const LOT_RETURN_WEIGHT: u64 = 100;

/// An auction lot and the most that will be bid for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLot {
    pub lot: Coin,
    pub max_bid: Coin,
}

/// A started auction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedAuction {
    pub auction_id: u64,
    pub lot: Coin,
    pub max_bid: Coin,
}

/// What a liquidation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidationOutcome {
    pub keeper_reward: Coins,
    pub auctions: Vec<StartedAuction>,
    /// Collateral returned to the borrower
    pub returned: Coins,
}

/// Split collateral into auction lots.
///
/// `deposit_values` and `borrow_values` are USD valuations of `deposits` and
/// `borrows`; `module_cash` caps each lot. Returns the lots and the collateral
/// left over.
pub fn plan_auctions(
    borrows: &Coins,
    deposits: &Coins,
    mut deposit_values: BTreeMap<String, Decimal>,
    mut borrow_values: BTreeMap<String, Decimal>,
    ltv: Decimal,
    data: &BTreeMap<String, Valuation>,
    module_cash: &Coins,
) -> MarketResult<(Vec<PlannedLot>, Coins)> {
    let mut borrows = borrows.clone();
    let mut deposits = deposits.clone();
    let mut lots = Vec::new();
    let borrow_denoms: Vec<String> = borrow_values.keys().cloned().collect();
    let deposit_denoms: Vec<String> = deposit_values.keys().cloned().collect();

    for b_denom in &borrow_denoms {
        let mut max_lot_usd = borrow_values[b_denom] / ltv;
        for d_denom in &deposit_denoms {
            if max_lot_usd.is_zero() {
                break;
            }
            let d_value = deposit_values[d_denom];
            let b_data = &data[b_denom];
            let d_data = &data[d_denom];

            let (lot, bid, full) = if d_value >= max_lot_usd {
                // This collateral covers the rest of the borrow
                let lot_units = Amount::truncate(d_data.units_for(max_lot_usd)).unwrap_or(Amount::ZERO);
                (
                    Coin::new(d_denom.as_str(), lot_units),
                    Coin::new(b_denom.as_str(), borrows.amount_of(b_denom)),
                    true,
                )
            } else {
                let bid_units =
                    Amount::truncate(b_data.units_for(d_value * ltv)).unwrap_or(Amount::ZERO);
                (
                    Coin::new(d_denom.as_str(), deposits.amount_of(d_denom)),
                    Coin::new(b_denom.as_str(), bid_units),
                    false,
                )
            };
            if lot.is_zero() || bid.is_zero() {
                continue;
            }

            let lot = Coin::new(lot.denom.as_str(), lot.amount.min(module_cash.amount_of(d_denom)));
            if deposits.amount_of(d_denom) < lot.amount {
                return Err(MarketError::InsufficientCoins {
                    lot: lot.to_string(),
                });
            }

            borrows = borrows.saturating_sub(&Coins::from(bid.clone()));
            deposits = deposits.saturating_sub(&Coins::from(lot.clone()));
            if full {
                borrow_values.insert(b_denom.clone(), Decimal::ZERO);
                let left = (d_value - max_lot_usd).max(Decimal::ZERO);
                deposit_values.insert(d_denom.clone(), left);
                max_lot_usd = Decimal::ZERO;
            } else {
                let left = (borrow_values[b_denom] - d_value * ltv).max(Decimal::ZERO);
                borrow_values.insert(b_denom.clone(), left);
                deposit_values.insert(d_denom.clone(), Decimal::ZERO);
                max_lot_usd = left / ltv;
            }
            lots.push(PlannedLot { lot, max_bid: bid });
        }
    }
    Ok((lots, deposits))
}

impl MoneyMarketKeeper<'_> {
    /// Liquidate `borrower` if their position is outside the valid
    /// loan-to-value range, paying the keeper reward to `keeper`
    pub fn attempt_keeper_liquidation(
        &mut self,
        keeper: &Address,
        borrower: &Address,
        auctions: &mut dyn AuctionKeeper,
    ) -> MarketResult<LiquidationOutcome> {
        if self.store.deposit(borrower).is_none() {
            return Err(MarketError::DepositNotFound(borrower.clone()));
        }
        if self.store.borrow(borrower).is_none() {
            return Err(MarketError::BorrowNotFound(borrower.clone()));
        }

        let deposit_before = self.deposit_amount(borrower);
        let borrow_before = self.borrow_amount(borrower);
        self.before_change(borrower, PositionKind::Deposit, &deposit_before)?;
        self.before_change(borrower, PositionKind::Borrow, &borrow_before)?;

        self.sync_borrow_interest(borrower);
        self.sync_supply_interest(borrower);

        let deposit = self.deposit_amount(borrower);
        let borrow = self.borrow_amount(borrower);
        if self.is_within_valid_ltv_range(&deposit, &borrow)? {
            warn!(borrower = %borrower, "Liquidation rejected: position within loan-to-value range");
            return Err(MarketError::BorrowNotLiquidatable(borrower.clone()));
        }

        let outcome = self.seize_deposits(keeper, borrower, &deposit, &borrow, auctions)?;

        self.store.remove_deposit(borrower);
        self.store.remove_borrow(borrower);
        self.after_change(borrower, PositionKind::Deposit, &deposit_before, &Coins::empty())?;
        self.after_change(borrower, PositionKind::Borrow, &borrow_before, &Coins::empty())?;

        Ok(outcome)
    }

    fn seize_deposits(
        &mut self,
        keeper: &Address,
        borrower: &Address,
        deposit: &Coins,
        borrow: &Coins,
        auctions: &mut dyn AuctionKeeper,
    ) -> MarketResult<LiquidationOutcome> {
        let data = self.valuations(deposit, borrow)?;
        let module = self.module_address();
        let now = self.ctx.time;

        let mut keeper_reward = Coins::empty();
        for (denom, amount) in deposit.iter() {
            let share = self.market(denom)?.keeper_reward_percentage;
            let reward = Amount::truncate(amount.value() * share).unwrap_or(Amount::ZERO);
            keeper_reward.add_coin(&Coin::new(denom, reward));
        }
        if !keeper_reward.is_empty() {
            self.bank.send(&module, keeper, &keeper_reward, now)?;
        }

        let auction_deposits = deposit.saturating_sub(&keeper_reward);
        let deposit_values: BTreeMap<String, Decimal> = auction_deposits
            .iter()
            .map(|(denom, amount)| (denom.to_string(), data[denom].usd_value(amount.value())))
            .collect();
        let borrow_values: BTreeMap<String, Decimal> = borrow
            .iter()
            .map(|(denom, amount)| (denom.to_string(), data[denom].usd_value(amount.value())))
            .collect();

        self.store.decrement_supplied(deposit)?;
        self.store.decrement_borrowed(borrow)?;

        let mut outcome = LiquidationOutcome {
            keeper_reward: keeper_reward.clone(),
            ..LiquidationOutcome::default()
        };

        let deposit_usd: Decimal = deposit_values.values().copied().sum();
        if deposit_usd.is_zero() {
            // The keeper took the whole deposit
            self.emit_liquidation(keeper, borrower, &Coins::empty(), &keeper_reward);
            return Ok(outcome);
        }
        let ltv = borrow_values.values().copied().sum::<Decimal>() / deposit_usd;

        let (lots, leftover) = plan_auctions(
            borrow,
            &auction_deposits,
            deposit_values,
            borrow_values,
            ltv,
            &data,
            &self.cash(),
        )?;

        if !leftover.is_empty() {
            self.bank.send(&module, borrower, &leftover, now)?;
            outcome.returned = leftover;
        }

        let auction_module = Address::module(AUCTION_MODULE_NAME);
        let lot_returns = [LotReturn {
            address: borrower.clone(),
            weight: LOT_RETURN_WEIGHT,
        }];
        let mut liquidated = Coins::empty();
        for planned in lots {
            self.bank
                .send(&module, &auction_module, &Coins::from(planned.lot.clone()), now)?;
            let auction_id = auctions.start_collateral_auction(
                &self.params.module_name,
                &planned.lot,
                &planned.max_bid,
                &lot_returns,
            )?;
            liquidated.add_coin(&planned.lot);
            self.emit(
                ModuleEvent::new(EventKind::HardAuctionStarted)
                    .with("auction_id", auction_id)
                    .with("lot", &planned.lot)
                    .with("max_bid", &planned.max_bid),
            );
            outcome.auctions.push(StartedAuction {
                auction_id,
                lot: planned.lot,
                max_bid: planned.max_bid,
            });
        }

        self.emit_liquidation(keeper, borrower, &liquidated, &keeper_reward);
        Ok(outcome)
    }

    fn emit_liquidation(&mut self, keeper: &Address, borrower: &Address, liquidated: &Coins, reward: &Coins) {
        info!(
            borrower = %borrower,
            keeper = %keeper,
            liquidated = %liquidated,
            keeper_reward = %reward,
            "Position liquidated"
        );
        self.emit(
            ModuleEvent::new(EventKind::HardLiquidation)
                .with("liquidated_owner", borrower)
                .with("liquidated_coins", liquidated)
                .with("keeper", keeper)
                .with("keeper_reward_coins", reward),
        );
    }
}

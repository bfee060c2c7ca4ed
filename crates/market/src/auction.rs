//! Collateral auction contract
//!
//! Seized collateral is handed to an external auction module. The market
//! moves each lot into the auction module account, then asks the auction
//! keeper to start the auction.

use harbor_core::{Address, Coin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Module account that holds lots while they are auctioned
pub const AUCTION_MODULE_NAME: &str = "auction";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuctionError {
    #[error("Invalid auction lot {lot}: {reason}")]
    InvalidLot { lot: String, reason: String },

    #[error("Invalid maximum bid {bid}: {reason}")]
    InvalidBid { bid: String, reason: String },

    #[error("Auction module rejected the auction: {0}")]
    Rejected(String),
}

/// Recipient of collateral left over once the debt is covered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotReturn {
    pub address: Address,
    pub weight: u64,
}

pub trait AuctionKeeper {
    /// Start a collateral auction selling `lot` for at most `max_bid`.
    ///
    /// Returns the auction id.
    fn start_collateral_auction(
        &mut self,
        seller: &str,
        lot: &Coin,
        max_bid: &Coin,
        lot_returns: &[LotReturn],
    ) -> Result<u64, AuctionError>;
}

/// A started collateral auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAuction {
    pub id: u64,
    pub seller: String,
    pub lot: Coin,
    pub max_bid: Coin,
    pub lot_returns: Vec<LotReturn>,
}

/// Auction keeper recording started auctions
#[derive(Debug, Clone, Default)]
pub struct MockAuctionHouse {
    auctions: Vec<CollateralAuction>,
    next_id: u64,
    reject: bool,
}

impl MockAuctionHouse {
    pub fn new() -> Self {
        Self {
            auctions: Vec::new(),
            next_id: 1,
            reject: false,
        }
    }

    /// Refuse every auction
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new()
        }
    }

    pub fn auctions(&self) -> &[CollateralAuction] {
        &self.auctions
    }
}

impl AuctionKeeper for MockAuctionHouse {
    fn start_collateral_auction(
        &mut self,
        seller: &str,
        lot: &Coin,
        max_bid: &Coin,
        lot_returns: &[LotReturn],
    ) -> Result<u64, AuctionError> {
        if self.reject {
            return Err(AuctionError::Rejected("auctions disabled".to_string()));
        }
        if lot.is_zero() {
            return Err(AuctionError::InvalidLot {
                lot: lot.to_string(),
                reason: "lot must be positive".to_string(),
            });
        }
        if max_bid.is_zero() {
            return Err(AuctionError::InvalidBid {
                bid: max_bid.to_string(),
                reason: "bid must be positive".to_string(),
            });
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.auctions.push(CollateralAuction {
            id,
            seller: seller.to_string(),
            lot: lot.clone(),
            max_bid: max_bid.clone(),
            lot_returns: lot_returns.to_vec(),
        });
        Ok(id)
    }
}

//! Harbor Hooks - Ledger Mutation Events
//!
//! Every balance-changing ledger operation brackets its mutation with two
//! events, dispatched synchronously to an explicit list of listeners:
//!
//! ```text
//! Deposit / Withdraw / Borrow / Repay / Liquidate
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ BalanceWillChange           │ ← listeners settle rewards earned
//! │ (pre-mutation shares)       │   on the old balance
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ LEDGER MUTATION             │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ BalanceDidChange            │ ← listeners snapshot indexes for
//! │ (before and after shares)   │   newly entered sources
//! └─────────────────────────────┘
//! ```
//!
//! A listener error aborts the surrounding operation.

pub mod error;
pub mod event;
pub mod registry;
pub mod traits;

pub use error::{HookError, HookResult};
pub use event::{shares_from_coins, LedgerEvent, PositionKind, SourceShares};
pub use registry::HookRegistry;
pub use traits::LedgerListener;

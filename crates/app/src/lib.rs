//! Harbor App - application wiring for the money market and incentives
//!
//! The application owns all module state and runs every message as one
//! atomic unit of work:
//!
//! ```text
//! Msg ──▶ validate_basic ──▶ snapshot ──▶ MoneyMarketKeeper / RewardKeeper
//!                                              │
//!                                   ok ◀───────┴───────▶ err
//!                                   │                     │
//!                            keep state,           restore snapshot,
//!                            persist events        halt when fatal
//! ```

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod genesis;
pub mod msg;
pub mod query;
pub mod state;

pub use app::{App, Collaborators};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use genesis::{GenesisState, IncentiveGenesis, MarketGenesis};
pub use msg::{Msg, Selection};
pub use query::{Page, RewardFactor, DEFAULT_PAGE_LIMIT};
pub use state::{AppState, StateSources};

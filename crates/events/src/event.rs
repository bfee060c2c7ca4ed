//! Module events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use strum_macros::{Display as StrumDisplay, EnumString};

/// Kinds of events emitted by the market and incentive modules
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, StrumDisplay,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    HardDeposit,
    HardWithdrawal,
    HardBorrow,
    HardRepay,
    HardLiquidation,
    HardAuctionStarted,
    ClaimReward,
    InterestAccrued,
    RewardsAccumulated,
}

/// An event with string attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEvent {
    pub kind: EventKind,
    pub attributes: BTreeMap<String, String>,
}

impl ModuleEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute (builder pattern)
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Events emitted while executing one unit of work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<ModuleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: ModuleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ModuleEvent] {
        &self.events
    }

    /// Events of one kind, in emission order
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &ModuleEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Drain the log
    pub fn take(&mut self) -> Vec<ModuleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A committed event with the block it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub height: u64,
    pub time: DateTime<Utc>,
    pub event: ModuleEvent,
}

impl EventRecord {
    pub fn new(height: u64, time: DateTime<Utc>, event: ModuleEvent) -> Self {
        Self {
            height,
            time,
            event,
        }
    }
}

//! Account addresses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks a module-owned account
const MODULE_PREFIX: &str = "module/";

/// An account address.
///
/// User accounts carry an opaque identifier; module accounts are derived from
/// the module name so every component resolves the same custody address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Address of the account owned by module `name`
    pub fn module(name: &str) -> Self {
        Self(format!("{}{}", MODULE_PREFIX, name))
    }

    pub fn is_module(&self) -> bool {
        self.0.starts_with(MODULE_PREFIX)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_address() {
        let addr = Address::module("hard");
        assert_eq!(addr.as_str(), "module/hard");
        assert!(addr.is_module());
        assert!(!Address::new("kava1alice").is_module());
    }

    #[test]
    fn test_blank_address_is_empty() {
        assert!(Address::new("  ").is_empty());
    }
}

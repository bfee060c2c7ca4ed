//! Map deserialization that rejects repeated keys
//!
//! A plain `BTreeMap` keeps the last value of a repeated JSON key. State
//! imported from a document must fail instead, so keyed stores deserialize
//! through these helpers:
//!
//! ```
//! use harbor_core::unique;
//! use serde::Deserialize;
//! use std::collections::BTreeMap;
//!
//! #[derive(Deserialize)]
//! struct Store {
//!     #[serde(deserialize_with = "unique::map")]
//!     factors: BTreeMap<String, u32>,
//! }
//!
//! let err = serde_json::from_str::<Store>(r#"{"factors":{"a":1,"a":2}}"#);
//! assert!(err.is_err());
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// A map deserialized without repeated keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueMap<K, V>(pub BTreeMap<K, V>);

impl<K, V> From<UniqueMap<K, V>> for BTreeMap<K, V> {
    fn from(map: UniqueMap<K, V>) -> Self {
        map.0
    }
}

struct UniqueMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for UniqueMapVisitor<K, V>
where
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    type Value = BTreeMap<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map without repeated keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<K, V>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key {}", key)));
            }
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for UniqueMap<K, V>
where
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_map(UniqueMapVisitor(PhantomData))
            .map(UniqueMap)
    }
}

/// `deserialize_with` for a map of unique keys
pub fn map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    UniqueMap::deserialize(deserializer).map(BTreeMap::from)
}

/// `deserialize_with` for a two-level map, unique at both levels
pub fn nested_map<'de, D, K, K2, V>(
    deserializer: D,
) -> Result<BTreeMap<K, BTreeMap<K2, V>>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + fmt::Display,
    K2: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    let outer: UniqueMap<K, UniqueMap<K2, V>> = UniqueMap::deserialize(deserializer)?;
    Ok(outer.0.into_iter().map(|(k, inner)| (k, inner.0)).collect())
}

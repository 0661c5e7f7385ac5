use std::fmt;
use std::fs;
use std::hash::Hash;
use std::marker::PhantomData;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{MAX_SCORE, ScoreEntry, ScoreId, User, UserId};

/// Errors raised while loading or writing a snapshot
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot location could not be read or written
    #[error("snapshot '{location}' is not accessible: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    /// The snapshot did not match the expected schema
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    /// The store could not be encoded as a snapshot
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// In-memory dataset: users and scores keyed by id, in insertion order.
///
/// Loaded once from a snapshot; mutations are never written back. Snapshot
/// scores must lie in `0..=MAX_SCORE`, the same range new scores are held to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    #[serde(deserialize_with = "unique_entries")]
    pub users: IndexMap<UserId, User>,
    #[serde(deserialize_with = "unique_entries")]
    pub scores: IndexMap<ScoreId, ScoreEntry>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the snapshot stored at `location`
    pub fn load(location: &str) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(location).map_err(|source| StoreError::Io {
            location: location.to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse a snapshot document
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let store: Store =
            serde_json::from_str(raw).map_err(|e| StoreError::MalformedSnapshot(e.to_string()))?;

        if let Some((key, user)) = store.users.iter().find(|(key, user)| **key != user.id) {
            return Err(StoreError::MalformedSnapshot(format!(
                "users entry '{}' holds user '{}'",
                key, user.id
            )));
        }
        if let Some((key, score)) = store.scores.iter().find(|(key, score)| **key != score.id) {
            return Err(StoreError::MalformedSnapshot(format!(
                "scores entry '{}' holds score '{}'",
                key, score.id
            )));
        }
        if let Some(score) = store.scores.values().find(|score| score.score > MAX_SCORE) {
            return Err(StoreError::MalformedSnapshot(format!(
                "score '{}' has value {} outside 0..={}",
                score.id, score.score, MAX_SCORE
            )));
        }

        Ok(store)
    }

    /// Encode the store as a pretty-printed snapshot document
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(StoreError::Encode)
    }

    /// Write the store as a snapshot to `location`
    pub fn save(&self, location: &str) -> Result<(), StoreError> {
        let raw = self.to_json()?;
        fs::write(location, raw).map_err(|source| StoreError::Io {
            location: location.to_string(),
            source,
        })
    }
}

/// Deserialize a map, rejecting keys that appear more than once
fn unique_entries<'de, D, K, V>(deserializer: D) -> Result<IndexMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash + fmt::Display,
    V: Deserialize<'de>,
{
    struct UniqueEntries<K, V>(PhantomData<(K, V)>);

    impl<'de, K, V> Visitor<'de> for UniqueEntries<K, V>
    where
        K: Deserialize<'de> + Eq + Hash + fmt::Display,
        V: Deserialize<'de>,
    {
        type Value = IndexMap<K, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of unique ids to entities")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<K, V>()? {
                match map.entry(key) {
                    Entry::Occupied(slot) => {
                        return Err(de::Error::custom(format_args!("duplicate id '{}'", slot.key())));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueEntries(PhantomData))
}

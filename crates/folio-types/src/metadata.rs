//! Bounded key/value metadata attached to accounts and entries.
//!
//! The map is backed by a `BTreeMap`, so iteration and the canonical JSON
//! encoding are sorted by key. Logically equal maps therefore always encode
//! to identical bytes, which is what idempotency hashing relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum number of key/value pairs.
pub const MAX_PAIRS: usize = 20;
/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 64;
/// Maximum value length in bytes.
pub const MAX_VALUE_LEN: usize = 256;
/// Maximum size of the canonical JSON encoding in bytes.
pub const MAX_CANONICAL_BYTES: usize = 4096;

/// Bounded, sorted string map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert a pair, rejecting writes that would break the limits.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<(), TypeError> {
        check_pair(key, value)?;
        if !self.0.contains_key(key) && self.0.len() >= MAX_PAIRS {
            return Err(TypeError::MetadataTooManyPairs {
                count: self.0.len() + 1,
                limit: MAX_PAIRS,
            });
        }
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// This map with `patch` applied on top, key by key in sorted order.
    /// Fails if the result would break any limit; `self` is untouched.
    pub fn merged(&self, patch: &Metadata) -> Result<Metadata, TypeError> {
        let mut out = self.clone();
        for (k, v) in patch.iter() {
            out.insert(k, v)?;
        }
        out.validate()?;
        Ok(out)
    }

    /// Deterministic sorted-key JSON encoding. Empty maps encode as `{}`.
    pub fn canonical_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(&self.0).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Check every limit. Maps built through serde carry unchecked input, so
    /// boundaries validate before use.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.0.len() > MAX_PAIRS {
            return Err(TypeError::MetadataTooManyPairs {
                count: self.0.len(),
                limit: MAX_PAIRS,
            });
        }
        for (k, v) in &self.0 {
            check_pair(k, v)?;
        }
        let encoded = self.canonical_json()?;
        if encoded.len() > MAX_CANONICAL_BYTES {
            return Err(TypeError::MetadataTooLarge {
                len: encoded.len(),
                limit: MAX_CANONICAL_BYTES,
            });
        }
        Ok(())
    }
}

fn check_pair(key: &str, value: &str) -> Result<(), TypeError> {
    if key.is_empty() {
        return Err(TypeError::MetadataEmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(TypeError::MetadataKeyTooLong {
            key: key.to_string(),
            len: key.len(),
            limit: MAX_KEY_LEN,
        });
    }
    if value.len() > MAX_VALUE_LEN {
        return Err(TypeError::MetadataValueTooLong {
            key: key.to_string(),
            len: value.len(),
            limit: MAX_VALUE_LEN,
        });
    }
    Ok(())
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Metadata {
    /// Accepts a JSON object or `null` (the empty map).
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = Option::<BTreeMap<String, String>>::deserialize(deserializer)?;
        Ok(Self(map.unwrap_or_default()))
    }
}

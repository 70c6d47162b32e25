//! Typed client for ordered map operations.

use crate::backend::StoreBackend;
use crate::error::StoreError;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::types::{decode_value, encode_value, RangeQuery, StoreKey, StoreName, StoreValue, Ttl};
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;

/// Client for one remote ordered map
///
/// Values serialize transparently; the map keeps entries in key order and
/// expires them after their TTL. Every operation runs under the client's
/// retry policy, so transient backend failures are absorbed up to the
/// configured budget and only the final failure reaches the caller.
pub struct OrderedMapClient<V: StoreValue> {
    backend: Arc<dyn StoreBackend>,
    name: StoreName,
    executor: RetryExecutor,
    _values: PhantomData<fn() -> V>,
}

impl<V: StoreValue> OrderedMapClient<V> {
    pub(crate) fn new(
        backend: Arc<dyn StoreBackend>,
        name: StoreName,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            name,
            executor: RetryExecutor::new(retry_policy),
            _values: PhantomData,
        }
    }

    /// Get the map name
    pub fn name(&self) -> &StoreName {
        &self.name
    }

    /// Read the value stored under a key
    ///
    /// Returns `None` when the key is absent or its entry has expired.
    pub async fn get(&self, key: &StoreKey) -> Result<Option<V>, StoreError> {
        let raw = self
            .executor
            .run("map.get", || self.backend.get(&self.name, key))
            .await?;

        match raw {
            Some(bytes) => Ok(Some(decode_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a run of entries in key order
    ///
    /// Bounds in the query are exclusive; see [`RangeQuery`] for the
    /// available knobs. Entries come back as `(key, value)` pairs in the
    /// requested direction.
    pub async fn get_range(&self, query: RangeQuery) -> Result<Vec<(StoreKey, V)>, StoreError> {
        query.validate()?;

        let raw = self
            .executor
            .run("map.get_range", || {
                self.backend.get_range(&self.name, &query)
            })
            .await?;

        let mut entries = Vec::with_capacity(raw.len());
        for (key, bytes) in raw {
            entries.push((key, decode_value(&bytes)?));
        }

        Ok(entries)
    }

    /// Write a value under a key with the given expiration
    ///
    /// Returns `true` when the key was newly created, `false` when an
    /// existing live entry was overwritten.
    pub async fn set(&self, key: &StoreKey, value: &V, ttl: Ttl) -> Result<bool, StoreError> {
        let encoded = encode_value(value)?;

        let newly_created = self
            .executor
            .run("map.set", || {
                self.backend.set(&self.name, key, encoded.clone(), ttl)
            })
            .await?;

        debug!(map = %self.name, key = %key, newly_created, "Stored map entry");
        Ok(newly_created)
    }

    /// Delete the entry under a key
    ///
    /// Removing an absent key succeeds without effect.
    pub async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.executor
            .run("map.remove", || self.backend.remove(&self.name, key))
            .await?;

        debug!(map = %self.name, key = %key, "Removed map entry");
        Ok(())
    }

    /// Atomically rewrite the value under a key
    ///
    /// The backend applies `apply` to the current value (or `None` when
    /// the key is absent) and stores the result with the given expiration.
    /// No other writer can interleave between the read and the store.
    ///
    /// Retried attempts re-run the transform against the then-current
    /// value, so `apply` must be pure and idempotent under at-least-once
    /// application. Returns the value that was stored.
    pub async fn update<F>(&self, key: &StoreKey, ttl: Ttl, apply: F) -> Result<V, StoreError>
    where
        F: Fn(Option<V>) -> V + Send + Sync,
    {
        let transform = |current: Option<Bytes>| -> Result<Bytes, StoreError> {
            let decoded = match current {
                Some(bytes) => Some(decode_value::<V>(&bytes)?),
                None => None,
            };

            Ok(encode_value(&apply(decoded))?)
        };

        let stored = self
            .executor
            .run("map.update", || {
                self.backend.update(&self.name, key, ttl, &transform)
            })
            .await?;

        debug!(map = %self.name, key = %key, "Updated map entry");
        Ok(decode_value(&stored)?)
    }
}

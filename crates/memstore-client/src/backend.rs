//! Backend abstraction for remote store connections.
//!
//! The typed clients speak to a backend through these traits and only at
//! the byte level; serialization stays on the client side. Production
//! deployments wire in a connection to the managed store service, tests
//! wire in [`crate::backends::MemoryBackend`].

use crate::error::StoreError;
use crate::types::{BatchReceipt, DequeueOptions, Priority, RangeQuery, StoreKey, StoreName, Ttl};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Transform applied to the current raw value during an atomic update
///
/// Backends invoke the transform exactly once per attempt while holding
/// whatever exclusivity they can offer for the key. Transforms must be
/// pure: a retried attempt may observe a different current value.
pub type UpdateFn<'a> = dyn Fn(Option<Bytes>) -> Result<Bytes, StoreError> + Send + Sync + 'a;

/// One dequeued batch at the byte level
#[derive(Debug, Clone)]
pub struct RawBatch {
    /// Encoded item payloads in dequeue order
    pub values: Vec<Bytes>,

    /// Receipt for acknowledging this batch
    pub receipt: BatchReceipt,
}

/// Ordered map operations a backend must support
#[async_trait]
pub trait MapBackend: Send + Sync {
    /// Read the value stored under a key
    ///
    /// Returns `None` when the key is absent or its entry has expired.
    async fn get(&self, map: &StoreName, key: &StoreKey) -> Result<Option<Bytes>, StoreError>;

    /// Read a contiguous run of entries in key order
    ///
    /// Bounds in the query are exclusive. An inverted or empty bound pair
    /// yields an empty result rather than an error.
    async fn get_range(
        &self,
        map: &StoreName,
        query: &RangeQuery,
    ) -> Result<Vec<(StoreKey, Bytes)>, StoreError>;

    /// Write a value under a key with the given expiration
    ///
    /// Returns `true` when the key was newly created, `false` when an
    /// existing live entry was overwritten.
    async fn set(
        &self,
        map: &StoreName,
        key: &StoreKey,
        value: Bytes,
        ttl: Ttl,
    ) -> Result<bool, StoreError>;

    /// Delete the entry under a key
    ///
    /// Removing an absent key is not an error.
    async fn remove(&self, map: &StoreName, key: &StoreKey) -> Result<(), StoreError>;

    /// Atomically rewrite the value under a key
    ///
    /// The backend reads the current value, applies the transform, and
    /// stores the result with the given expiration, all without letting
    /// another writer interleave. Returns the stored bytes.
    async fn update(
        &self,
        map: &StoreName,
        key: &StoreKey,
        ttl: Ttl,
        transform: &UpdateFn<'_>,
    ) -> Result<Bytes, StoreError>;
}

/// Work queue operations a backend must support
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Append one item to a queue
    async fn enqueue(
        &self,
        queue: &StoreName,
        value: Bytes,
        ttl: Ttl,
        priority: Priority,
    ) -> Result<(), StoreError>;

    /// Lease a batch of items from the front of a queue
    ///
    /// Leased items stay invisible to other consumers for
    /// `invisibility_timeout`; unacknowledged items reappear afterwards.
    /// Returns `None` when the queue cannot satisfy the request within
    /// the configured wait.
    async fn dequeue(
        &self,
        queue: &StoreName,
        invisibility_timeout: Duration,
        options: &DequeueOptions,
    ) -> Result<Option<RawBatch>, StoreError>;

    /// Permanently delete a previously leased batch
    ///
    /// Fails with [`StoreError::ReceiptExpired`] when the receipt does not
    /// match a live lease, including leases that already timed out.
    async fn remove_batch(&self, queue: &StoreName, receipt: &BatchReceipt)
        -> Result<(), StoreError>;
}

/// Full backend surface required by the store facade
pub trait StoreBackend: MapBackend + QueueBackend {}

impl<T: MapBackend + QueueBackend> StoreBackend for T {}

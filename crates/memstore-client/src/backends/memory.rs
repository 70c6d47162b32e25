//! In-memory backend implementation for testing and development.
//!
//! This module provides a fully functional in-memory store that:
//! - Keeps ordered maps in key order with per-entry expiration
//! - Implements priority queues with invisibility leases and item TTL
//! - Provides thread-safe concurrent access
//!
//! This backend is intended for:
//! - Unit testing of memstore-client consumers
//! - Development and prototyping
//! - Reference implementation of the backend contract

use crate::backend::{MapBackend, QueueBackend, RawBatch, UpdateFn};
use crate::error::StoreError;
use crate::types::{
    BatchReceipt, DequeueOptions, Priority, RangeDirection, RangeQuery, StoreKey, StoreName,
    Timestamp, Ttl,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the in-memory backend
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum encoded size of a single value in bytes
    pub max_value_size: usize,

    /// How often blocked dequeues re-check the queue
    pub poll_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_value_size: 32 * 1024,
            poll_interval: Duration::from_millis(50),
        }
    }
}

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Queue items sort by descending priority, then insertion order
type ItemKey = (Reverse<i64>, u64);

/// Thread-safe storage for all maps and queues
#[derive(Default)]
struct StoreState {
    maps: HashMap<StoreName, MapState>,
    queues: HashMap<StoreName, QueueState>,
}

/// Internal state for a single ordered map
#[derive(Default)]
struct MapState {
    entries: BTreeMap<StoreKey, MapEntry>,
}

impl MapState {
    /// Evict entries that outlived their TTL
    ///
    /// Reads only filter expired entries; writes sweep them out so the
    /// map does not accrete dead keys.
    fn drop_expired_entries(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }
}

/// A value stored in a map with its expiration
struct MapEntry {
    value: Bytes,
    expires_at: Instant,
}

impl MapEntry {
    /// Check if the entry has outlived its TTL
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Internal state for a single work queue
#[derive(Default)]
struct QueueState {
    /// Insertion counter; breaks ties within a priority (FIFO)
    next_seq: u64,
    /// Items available for dequeuing
    items: BTreeMap<ItemKey, QueueItem>,
    /// Leased batches keyed by receipt identifier
    in_flight: HashMap<String, LeasedBatch>,
}

impl QueueState {
    /// Return items from lapsed leases to the queue
    ///
    /// Items go back under their original keys, so they keep their
    /// priority and insertion order on redelivery.
    fn reclaim_expired_leases(&mut self) {
        let now = Instant::now();
        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, lease)| now >= lease.lease_expires_at)
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(lease) = self.in_flight.remove(&id) {
                for (key, item) in lease.items {
                    self.items.insert(key, item);
                }
            }
        }
    }

    /// Drop queued items that outlived their TTL
    fn drop_expired_items(&mut self) {
        let now = Instant::now();
        self.items.retain(|_, item| now < item.expires_at);
    }
}

/// An item waiting in a queue with its expiration
struct QueueItem {
    value: Bytes,
    expires_at: Instant,
}

/// A batch currently leased to a consumer
struct LeasedBatch {
    items: Vec<(ItemKey, QueueItem)>,
    lease_expires_at: Instant,
}

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory backend implementation
pub struct MemoryBackend {
    state: Arc<RwLock<StoreState>>,
    config: MemoryConfig,
}

impl MemoryBackend {
    /// Create new in-memory backend with configuration
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            config,
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Backend {
            code: "poisoned-lock".to_string(),
            message: "storage lock poisoned by an earlier panic".to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Backend {
            code: "poisoned-lock".to_string(),
            message: "storage lock poisoned by an earlier panic".to_string(),
        })
    }

    fn check_value_size(&self, size: usize) -> Result<(), StoreError> {
        if size > self.config.max_value_size {
            return Err(StoreError::ValueTooLarge {
                size,
                max_size: self.config.max_value_size,
            });
        }

        Ok(())
    }

    /// Single non-blocking dequeue pass; the lock is released on return
    fn try_dequeue(
        &self,
        queue: &StoreName,
        invisibility_timeout: Duration,
        options: &DequeueOptions,
    ) -> Result<Option<RawBatch>, StoreError> {
        let mut state = self.write_state()?;
        let queue_state = match state.queues.get_mut(queue) {
            Some(queue_state) => queue_state,
            None => return Ok(None),
        };

        queue_state.reclaim_expired_leases();
        queue_state.drop_expired_items();

        let requested = options.count as usize;
        let available = queue_state.items.len();
        if available == 0 || requested == 0 {
            return Ok(None);
        }
        if options.all_or_nothing && available < requested {
            return Ok(None);
        }

        let take = requested.min(available);
        let mut leased = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(entry) = queue_state.items.pop_first() {
                leased.push(entry);
            }
        }

        let values = leased.iter().map(|(_, item)| item.value.clone()).collect();
        let receipt_id = uuid::Uuid::new_v4().to_string();
        let leased_until = Timestamp::from_datetime(
            Utc::now() + chrono::Duration::milliseconds(invisibility_timeout.as_millis() as i64),
        );

        queue_state.in_flight.insert(
            receipt_id.clone(),
            LeasedBatch {
                items: leased,
                lease_expires_at: Instant::now() + invisibility_timeout,
            },
        );

        Ok(Some(RawBatch {
            values,
            receipt: BatchReceipt::new(receipt_id, leased_until),
        }))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl MapBackend for MemoryBackend {
    async fn get(&self, map: &StoreName, key: &StoreKey) -> Result<Option<Bytes>, StoreError> {
        let state = self.read_state()?;

        let value = state
            .maps
            .get(map)
            .and_then(|map_state| map_state.entries.get(key))
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());

        Ok(value)
    }

    async fn get_range(
        &self,
        map: &StoreName,
        query: &RangeQuery,
    ) -> Result<Vec<(StoreKey, Bytes)>, StoreError> {
        let state = self.read_state()?;
        let map_state = match state.maps.get(map) {
            Some(map_state) => map_state,
            None => return Ok(Vec::new()),
        };

        if query.count == 0 {
            return Ok(Vec::new());
        }

        // BTreeMap::range panics on inverted bounds; with exclusive bounds
        // an inverted or equal pair is simply an empty range.
        if let (Some(lower), Some(upper)) = (&query.lower_bound, &query.upper_bound) {
            if lower >= upper {
                return Ok(Vec::new());
            }
        }

        let lower = match &query.lower_bound {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let upper = match &query.upper_bound {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };

        let mut collected = Vec::new();
        match query.direction {
            RangeDirection::Ascending => {
                for (key, entry) in map_state.entries.range((lower, upper)) {
                    if entry.is_expired() {
                        continue;
                    }
                    collected.push((key.clone(), entry.value.clone()));
                    if collected.len() == query.count as usize {
                        break;
                    }
                }
            }
            RangeDirection::Descending => {
                for (key, entry) in map_state.entries.range((lower, upper)).rev() {
                    if entry.is_expired() {
                        continue;
                    }
                    collected.push((key.clone(), entry.value.clone()));
                    if collected.len() == query.count as usize {
                        break;
                    }
                }
            }
        }

        Ok(collected)
    }

    async fn set(
        &self,
        map: &StoreName,
        key: &StoreKey,
        value: Bytes,
        ttl: Ttl,
    ) -> Result<bool, StoreError> {
        self.check_value_size(value.len())?;

        let mut state = self.write_state()?;
        let map_state = state.maps.entry(map.clone()).or_default();
        map_state.drop_expired_entries();

        let entry = MapEntry {
            value,
            expires_at: Instant::now() + ttl.as_duration(),
        };

        // Overwriting an expired entry counts as creating the key; the
        // sweep above already evicted it.
        let newly_created = map_state.entries.insert(key.clone(), entry).is_none();

        Ok(newly_created)
    }

    async fn remove(&self, map: &StoreName, key: &StoreKey) -> Result<(), StoreError> {
        let mut state = self.write_state()?;

        if let Some(map_state) = state.maps.get_mut(map) {
            map_state.drop_expired_entries();
            map_state.entries.remove(key);
        }

        Ok(())
    }

    async fn update(
        &self,
        map: &StoreName,
        key: &StoreKey,
        ttl: Ttl,
        transform: &UpdateFn<'_>,
    ) -> Result<Bytes, StoreError> {
        let mut state = self.write_state()?;
        let map_state = state.maps.entry(map.clone()).or_default();
        map_state.drop_expired_entries();

        // Transform runs under the write lock, so no other writer can
        // interleave between the read and the store.
        let current = map_state.entries.get(key).map(|entry| entry.value.clone());

        let next = transform(current)?;
        self.check_value_size(next.len())?;

        map_state.entries.insert(
            key.clone(),
            MapEntry {
                value: next.clone(),
                expires_at: Instant::now() + ttl.as_duration(),
            },
        );

        Ok(next)
    }
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn enqueue(
        &self,
        queue: &StoreName,
        value: Bytes,
        ttl: Ttl,
        priority: Priority,
    ) -> Result<(), StoreError> {
        self.check_value_size(value.len())?;

        let mut state = self.write_state()?;
        let queue_state = state.queues.entry(queue.clone()).or_default();

        let seq = queue_state.next_seq;
        queue_state.next_seq += 1;

        queue_state.items.insert(
            (Reverse(priority.as_i64()), seq),
            QueueItem {
                value,
                expires_at: Instant::now() + ttl.as_duration(),
            },
        );

        Ok(())
    }

    async fn dequeue(
        &self,
        queue: &StoreName,
        invisibility_timeout: Duration,
        options: &DequeueOptions,
    ) -> Result<Option<RawBatch>, StoreError> {
        let deadline = options.wait_timeout.map(|wait| Instant::now() + wait);

        loop {
            if let Some(batch) = self.try_dequeue(queue, invisibility_timeout, options)? {
                return Ok(Some(batch));
            }

            let deadline = match deadline {
                Some(deadline) => deadline,
                None => return Ok(None),
            };

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }

    async fn remove_batch(
        &self,
        queue: &StoreName,
        receipt: &BatchReceipt,
    ) -> Result<(), StoreError> {
        let mut state = self.write_state()?;

        let queue_state = match state.queues.get_mut(queue) {
            Some(queue_state) => queue_state,
            None => {
                return Err(StoreError::ReceiptExpired {
                    receipt: receipt.id().to_string(),
                })
            }
        };

        // A lapsed lease must not acknowledge, so reclaim before lookup
        queue_state.reclaim_expired_leases();

        match queue_state.in_flight.remove(receipt.id()) {
            Some(_) => Ok(()),
            None => Err(StoreError::ReceiptExpired {
                receipt: receipt.id().to_string(),
            }),
        }
    }
}

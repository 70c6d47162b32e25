//! Common test utilities for memstore integration tests
//!
//! This module provides:
//! - A flaky backend wrapper that injects scripted failures
//! - Helper functions for creating test fixtures
//! - Logging setup for debugging test runs

use async_trait::async_trait;
use bytes::Bytes;
use memstore_client::backend::{MapBackend, QueueBackend, RawBatch, UpdateFn};
use memstore_client::backends::MemoryBackend;
use memstore_client::error::StoreError;
use memstore_client::types::{
    BatchReceipt, DequeueOptions, Priority, RangeQuery, StoreKey, StoreName, Ttl,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Flaky Backend
// ============================================================================

type ErrorFactory = Box<dyn Fn() -> StoreError + Send + Sync>;

/// Backend wrapper that fails the next N calls before delegating
///
/// Wraps a real in-memory backend and records every call, so tests can
/// assert exactly how many invocations an operation took. Clones share
/// state with the original.
#[derive(Clone)]
#[allow(dead_code)]
pub struct FlakyBackend {
    inner: Arc<MemoryBackend>,
    failures_remaining: Arc<Mutex<u32>>,
    error_factory: Arc<Mutex<ErrorFactory>>,
    calls: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryBackend::default()),
            failures_remaining: Arc::new(Mutex::new(0)),
            error_factory: Arc::new(Mutex::new(Box::new(|| StoreError::Unavailable {
                message: "injected outage".to_string(),
            }))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the next `count` calls with a transient error
    pub fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().unwrap() = count;
    }

    /// Fail the next `count` calls with errors from the given factory
    pub fn fail_next_with<F>(&self, count: u32, factory: F)
    where
        F: Fn() -> StoreError + Send + Sync + 'static,
    {
        *self.failures_remaining.lock().unwrap() = count;
        *self.error_factory.lock().unwrap() = Box::new(factory);
    }

    /// Get every recorded call in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Count recorded calls for one operation
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.as_str() == operation)
            .count()
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    fn take_failure(&self) -> Option<StoreError> {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            let factory = self.error_factory.lock().unwrap();
            Some((*factory)())
        } else {
            None
        }
    }
}

impl Default for FlakyBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MapBackend for FlakyBackend {
    async fn get(&self, map: &StoreName, key: &StoreKey) -> Result<Option<Bytes>, StoreError> {
        self.record("map.get");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.get(map, key).await
    }

    async fn get_range(
        &self,
        map: &StoreName,
        query: &RangeQuery,
    ) -> Result<Vec<(StoreKey, Bytes)>, StoreError> {
        self.record("map.get_range");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.get_range(map, query).await
    }

    async fn set(
        &self,
        map: &StoreName,
        key: &StoreKey,
        value: Bytes,
        ttl: Ttl,
    ) -> Result<bool, StoreError> {
        self.record("map.set");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.set(map, key, value, ttl).await
    }

    async fn remove(&self, map: &StoreName, key: &StoreKey) -> Result<(), StoreError> {
        self.record("map.remove");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.remove(map, key).await
    }

    async fn update(
        &self,
        map: &StoreName,
        key: &StoreKey,
        ttl: Ttl,
        transform: &UpdateFn<'_>,
    ) -> Result<Bytes, StoreError> {
        self.record("map.update");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.update(map, key, ttl, transform).await
    }
}

#[async_trait]
impl QueueBackend for FlakyBackend {
    async fn enqueue(
        &self,
        queue: &StoreName,
        value: Bytes,
        ttl: Ttl,
        priority: Priority,
    ) -> Result<(), StoreError> {
        self.record("queue.enqueue");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.enqueue(queue, value, ttl, priority).await
    }

    async fn dequeue(
        &self,
        queue: &StoreName,
        invisibility_timeout: Duration,
        options: &DequeueOptions,
    ) -> Result<Option<RawBatch>, StoreError> {
        self.record("queue.dequeue");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.dequeue(queue, invisibility_timeout, options).await
    }

    async fn remove_batch(
        &self,
        queue: &StoreName,
        receipt: &BatchReceipt,
    ) -> Result<(), StoreError> {
        self.record("queue.acknowledge");
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.remove_batch(queue, receipt).await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

#[allow(dead_code)]
pub fn store_name(value: &str) -> StoreName {
    StoreName::new(value.to_string()).expect("test store name should be valid")
}

#[allow(dead_code)]
pub fn store_key(value: &str) -> StoreKey {
    StoreKey::new(value.to_string()).expect("test key should be valid")
}

#[allow(dead_code)]
pub fn ttl(seconds: u64) -> Ttl {
    Ttl::from_secs(seconds).expect("test TTL should be valid")
}

/// Initialize logging for test debugging; safe to call repeatedly
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memstore_client=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

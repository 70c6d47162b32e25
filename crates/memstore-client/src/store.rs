//! Store facade wiring typed clients to a backend connection.

use crate::backend::StoreBackend;
use crate::backends::MemoryBackend;
use crate::map::OrderedMapClient;
use crate::queue::WorkQueueClient;
use crate::retry::RetryPolicy;
use crate::types::{StoreName, StoreValue};
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// How long dequeued items stay invisible unless configured otherwise
pub const DEFAULT_INVISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration options for ordered map clients
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    /// Retry policy applied to every operation
    pub retry_policy: RetryPolicy,
}

impl MapOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

/// Configuration options for work queue clients
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Retry policy applied to every operation
    pub retry_policy: RetryPolicy,

    /// How long dequeued items stay invisible before redelivery
    pub invisibility_timeout: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            invisibility_timeout: DEFAULT_INVISIBILITY_TIMEOUT,
        }
    }
}

impl QueueOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Set the invisibility timeout
    pub fn with_invisibility_timeout(mut self, timeout: Duration) -> Self {
        self.invisibility_timeout = timeout;
        self
    }
}

/// Entry point for store access
///
/// Holds the backend connection and hands out typed clients. Clients
/// created from the same store share the connection, so a map client and
/// a queue client with the same name still address distinct resources.
/// The store is cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
}

impl Store {
    /// Create a store over an existing backend connection
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Create a store over a fresh in-memory backend
    ///
    /// Intended for tests and local development; state lives only as
    /// long as the store and its clients.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Get a typed client for the named ordered map with default options
    pub fn ordered_map<V: StoreValue>(&self, name: StoreName) -> OrderedMapClient<V> {
        self.ordered_map_with(name, MapOptions::default())
    }

    /// Get a typed client for the named ordered map
    pub fn ordered_map_with<V: StoreValue>(
        &self,
        name: StoreName,
        options: MapOptions,
    ) -> OrderedMapClient<V> {
        OrderedMapClient::new(self.backend.clone(), name, options.retry_policy)
    }

    /// Get a typed client for the named work queue with default options
    pub fn work_queue<V: StoreValue>(&self, name: StoreName) -> WorkQueueClient<V> {
        self.work_queue_with(name, QueueOptions::default())
    }

    /// Get a typed client for the named work queue
    pub fn work_queue_with<V: StoreValue>(
        &self,
        name: StoreName,
        options: QueueOptions,
    ) -> WorkQueueClient<V> {
        WorkQueueClient::new(
            self.backend.clone(),
            name,
            options.retry_policy,
            options.invisibility_timeout,
        )
    }
}

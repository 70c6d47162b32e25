//! # Memstore Client
//!
//! Resilient typed clients for TTL-backed remote memory stores, covering
//! ordered maps and priority work queues.
//!
//! This library provides:
//! - Ordered maps with exclusive-bound range scans and atomic updates
//! - Work queues with priorities, batch leases, and invisibility timeouts
//! - Bounded retries around every operation, immediate or with backoff
//! - Transparent serialization of application values
//! - An in-memory backend for tests and local development
//!
//! ## Module Organization
//!
//! - [error] - Error types for all store operations
//! - [types] - Domain identifiers, options, and receipts
//! - [retry] - Retry policies and the bounded executor
//! - [backend] - Byte-level backend traits
//! - [backends] - Backend implementations
//! - [map] - Typed ordered map client
//! - [queue] - Typed work queue client
//! - [store] - Facade handing out clients over one connection

// Module declarations
pub mod backend;
pub mod backends;
pub mod error;
pub mod map;
pub mod queue;
pub mod retry;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use backend::{MapBackend, QueueBackend, RawBatch, StoreBackend, UpdateFn};
pub use backends::{MemoryBackend, MemoryConfig};
pub use error::{SerializationError, StoreError, ValidationError};
pub use map::OrderedMapClient;
pub use queue::{DequeuedBatch, WorkQueueClient};
pub use retry::{RetryExecutor, RetryPolicy, RetryState, DEFAULT_MAX_RETRIES};
pub use store::{MapOptions, QueueOptions, Store, DEFAULT_INVISIBILITY_TIMEOUT};
pub use types::{
    BatchReceipt, DequeueOptions, Priority, RangeDirection, RangeQuery, StoreKey, StoreName,
    StoreValue, Timestamp, Ttl, MAX_RANGE_COUNT, MAX_TTL_SECONDS,
};

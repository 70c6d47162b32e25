//! Typed client for work queue operations.

use crate::backend::StoreBackend;
use crate::error::StoreError;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::types::{
    decode_value, encode_value, BatchReceipt, DequeueOptions, Priority, StoreName, StoreValue, Ttl,
};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// One leased batch of typed items
///
/// The receipt acknowledges the whole batch at once. Until it is
/// acknowledged, the items stay invisible to other consumers for the
/// queue's invisibility timeout and reappear afterwards.
#[derive(Debug)]
pub struct DequeuedBatch<V> {
    /// Items in dequeue order
    pub items: Vec<V>,

    /// Receipt for acknowledging this batch
    pub receipt: BatchReceipt,
}

/// Client for one remote work queue
///
/// Producers enqueue values with a TTL and optional priority; consumers
/// lease batches and acknowledge them once processed. Every operation
/// runs under the client's retry policy. Delivery is at-least-once: a
/// crashed consumer's items reappear after the invisibility timeout.
pub struct WorkQueueClient<V: StoreValue> {
    backend: Arc<dyn StoreBackend>,
    name: StoreName,
    executor: RetryExecutor,
    invisibility_timeout: Duration,
    _values: PhantomData<fn() -> V>,
}

impl<V: StoreValue> WorkQueueClient<V> {
    pub(crate) fn new(
        backend: Arc<dyn StoreBackend>,
        name: StoreName,
        retry_policy: RetryPolicy,
        invisibility_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            name,
            executor: RetryExecutor::new(retry_policy),
            invisibility_timeout,
            _values: PhantomData,
        }
    }

    /// Get the queue name
    pub fn name(&self) -> &StoreName {
        &self.name
    }

    /// Get how long dequeued items stay invisible before redelivery
    pub fn invisibility_timeout(&self) -> Duration {
        self.invisibility_timeout
    }

    /// Append one item with default priority
    pub async fn enqueue(&self, value: &V, ttl: Ttl) -> Result<(), StoreError> {
        self.enqueue_with_priority(value, ttl, Priority::default())
            .await
    }

    /// Append one item with an explicit priority
    ///
    /// Higher priorities dequeue first; items sharing a priority dequeue
    /// in insertion order. Unconsumed items vanish once their TTL lapses.
    ///
    /// A retried enqueue can append the item twice when the backend fails
    /// after the append took effect. Consumers must tolerate duplicates.
    pub async fn enqueue_with_priority(
        &self,
        value: &V,
        ttl: Ttl,
        priority: Priority,
    ) -> Result<(), StoreError> {
        let encoded = encode_value(value)?;

        self.executor
            .run("queue.enqueue", || {
                self.backend
                    .enqueue(&self.name, encoded.clone(), ttl, priority)
            })
            .await?;

        debug!(queue = %self.name, priority = %priority, "Enqueued item");
        Ok(())
    }

    /// Lease a batch of items from the front of the queue
    ///
    /// Returns `None` when the queue cannot satisfy the request within
    /// the configured wait. With `all_or_nothing` set, fewer available
    /// items than requested also yields `None` instead of a short batch.
    pub async fn dequeue(
        &self,
        options: DequeueOptions,
    ) -> Result<Option<DequeuedBatch<V>>, StoreError> {
        options.validate()?;

        let raw = self
            .executor
            .run("queue.dequeue", || {
                self.backend
                    .dequeue(&self.name, self.invisibility_timeout, &options)
            })
            .await?;

        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let mut items = Vec::with_capacity(raw.values.len());
        for bytes in &raw.values {
            items.push(decode_value(bytes)?);
        }

        debug!(
            queue = %self.name,
            items = items.len(),
            receipt = raw.receipt.id(),
            "Leased batch"
        );

        Ok(Some(DequeuedBatch {
            items,
            receipt: raw.receipt,
        }))
    }

    /// Permanently delete a previously leased batch
    ///
    /// Fails with [`StoreError::ReceiptExpired`] when the receipt's lease
    /// already lapsed or the batch was acknowledged before. Items from a
    /// lapsed lease are back in the queue and will be redelivered.
    pub async fn acknowledge(&self, receipt: BatchReceipt) -> Result<(), StoreError> {
        self.executor
            .run("queue.acknowledge", || {
                self.backend.remove_batch(&self.name, &receipt)
            })
            .await?;

        debug!(queue = %self.name, receipt = receipt.id(), "Acknowledged batch");
        Ok(())
    }
}

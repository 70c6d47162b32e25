//! Domain types for store operations including core identifiers and options.

use crate::error::{SerializationError, ValidationError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Maximum expiration the backend accepts for any entry or item (45 days).
pub const MAX_TTL_SECONDS: u64 = 3_888_000;

/// Maximum number of entries a single range scan may request.
pub const MAX_RANGE_COUNT: u32 = 200;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated name of a remote map or queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreName(String);

impl StoreName {
    /// Create new store name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        // Validate length
        if name.is_empty() || name.len() > 128 {
            return Err(ValidationError::OutOfRange {
                field: "store_name".to_string(),
                message: "must be 1-128 characters".to_string(),
            });
        }

        // Validate characters (ASCII alphanumeric, hyphens, underscores)
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "store_name".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "store_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get store name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Validated key within an ordered map
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);

impl StoreKey {
    /// Create new key with validation
    pub fn new(key: String) -> Result<Self, ValidationError> {
        if key.is_empty() {
            return Err(ValidationError::Required {
                field: "key".to_string(),
            });
        }

        if key.len() > 128 {
            return Err(ValidationError::OutOfRange {
                field: "key".to_string(),
                message: "maximum 128 characters".to_string(),
            });
        }

        // Validate ASCII printable characters only
        if !key.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(ValidationError::InvalidFormat {
                field: "key".to_string(),
                message: "only ASCII printable characters allowed".to_string(),
            });
        }

        Ok(Self(key))
    }

    /// Get key as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Time-to-live for a map entry or queue item
///
/// Every value written to the store expires; the backend caps expirations
/// at [`MAX_TTL_SECONDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ttl(u64);

impl Ttl {
    /// Create a TTL from whole seconds with validation
    pub fn from_secs(seconds: u64) -> Result<Self, ValidationError> {
        if seconds == 0 || seconds > MAX_TTL_SECONDS {
            return Err(ValidationError::OutOfRange {
                field: "ttl".to_string(),
                message: format!("must be 1-{} seconds", MAX_TTL_SECONDS),
            });
        }

        Ok(Self(seconds))
    }

    /// Get TTL in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Get TTL as a duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

/// Dequeue priority for queue items; higher priorities are served first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Priority(i64);

impl Priority {
    /// Create new priority
    pub fn new(priority: i64) -> Self {
        Self(priority)
    }

    /// Get numeric value
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = s.parse::<DateTime<Utc>>()?;
        Ok(Self::from_datetime(dt))
    }
}

/// Opaque token for acknowledging one dequeued batch
///
/// A receipt is only honored while its lease is live; once the invisibility
/// timeout lapses the batch returns to the queue and the receipt is void.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    id: String,
    leased_until: Timestamp,
}

impl BatchReceipt {
    /// Create new batch receipt
    pub fn new(id: String, leased_until: Timestamp) -> Self {
        Self { id, leased_until }
    }

    /// Get receipt identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the time the batch lease lapses
    pub fn leased_until(&self) -> &Timestamp {
        &self.leased_until
    }

    /// Check if the lease has already lapsed
    pub fn is_expired(&self) -> bool {
        Timestamp::now() >= self.leased_until
    }
}

// ============================================================================
// Value Capability
// ============================================================================

/// Capability required of application values stored in maps and queues.
///
/// Any serde-serializable type qualifies; the wire encoding used between
/// the typed clients and the backend is JSON.
pub trait StoreValue: Serialize + DeserializeOwned + Send + Sync {}

impl<T: Serialize + DeserializeOwned + Send + Sync> StoreValue for T {}

/// Encode a value for the byte-level backend boundary
pub(crate) fn encode_value<V: StoreValue>(value: &V) -> Result<Bytes, SerializationError> {
    let encoded = serde_json::to_vec(value).map_err(SerializationError::Encode)?;
    Ok(Bytes::from(encoded))
}

/// Decode a value received from the byte-level backend boundary
pub(crate) fn decode_value<V: StoreValue>(bytes: &Bytes) -> Result<V, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Decode)
}

// ============================================================================
// Range Scan Options
// ============================================================================

/// Scan direction for ordered map range queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeDirection {
    #[default]
    Ascending,
    Descending,
}

/// Configuration options for ordered map range scans
///
/// Bounds are exclusive: only keys strictly between `lower_bound` and
/// `upper_bound` are returned. An unset bound is unbounded on that side.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    /// Scan direction
    pub direction: RangeDirection,
    /// Maximum number of entries to return (1 to [`MAX_RANGE_COUNT`])
    pub count: u32,
    /// Exclusive lower key bound
    pub lower_bound: Option<StoreKey>,
    /// Exclusive upper key bound
    pub upper_bound: Option<StoreKey>,
}

impl Default for RangeQuery {
    fn default() -> Self {
        Self {
            direction: RangeDirection::Ascending,
            count: 100,
            lower_bound: None,
            upper_bound: None,
        }
    }
}

impl RangeQuery {
    /// Create new range query with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan in ascending key order
    pub fn ascending(mut self) -> Self {
        self.direction = RangeDirection::Ascending;
        self
    }

    /// Scan in descending key order
    pub fn descending(mut self) -> Self {
        self.direction = RangeDirection::Descending;
        self
    }

    /// Set maximum number of entries to return
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set exclusive lower key bound
    pub fn with_lower_bound(mut self, key: StoreKey) -> Self {
        self.lower_bound = Some(key);
        self
    }

    /// Set exclusive upper key bound
    pub fn with_upper_bound(mut self, key: StoreKey) -> Self {
        self.upper_bound = Some(key);
        self
    }

    /// Validate query limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 || self.count > MAX_RANGE_COUNT {
            return Err(ValidationError::OutOfRange {
                field: "count".to_string(),
                message: format!("must be 1-{}", MAX_RANGE_COUNT),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Dequeue Options
// ============================================================================

/// Configuration options for dequeuing items from a work queue
#[derive(Debug, Clone)]
pub struct DequeueOptions {
    /// Number of items requested
    pub count: u32,
    /// Dequeue either the full requested count or nothing at all
    pub all_or_nothing: bool,
    /// How long the backend may wait for items to become available
    pub wait_timeout: Option<Duration>,
}

impl Default for DequeueOptions {
    fn default() -> Self {
        Self {
            count: 1,
            all_or_nothing: false,
            wait_timeout: None,
        }
    }
}

impl DequeueOptions {
    /// Create new dequeue options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of items requested
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Require the full requested count or nothing
    pub fn all_or_nothing(mut self) -> Self {
        self.all_or_nothing = true;
        self
    }

    /// Set maximum time to wait for items to become available
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Validate option limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::OutOfRange {
                field: "count".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

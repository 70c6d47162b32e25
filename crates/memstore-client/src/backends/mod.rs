//! Backend implementations.

pub mod memory;

pub use memory::{MemoryBackend, MemoryConfig};

pub mod memory;

pub use memory::MemoryStorage;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Result;

/// Durable key-value store backing one object instance.
///
/// Each instance owns its store exclusively; keys are plain field names plus
/// the reserved `__persisted` bookkeeping record. Implementations outside this
/// crate adapt whatever durable medium the deployment provides.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads one record, `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes one record, replacing any previous value.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Removes one record, reporting whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every record for this instance.
    async fn delete_all(&self) -> Result<()>;

    /// Returns every record currently held.
    async fn list(&self) -> Result<BTreeMap<String, Value>>;
}

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use super::Transport;
use crate::core::{ObjectId, Result, StateError};

/// Resolves opaque identities to live instance transports.
///
/// Identity management mirrors the addressable-instance model: fresh ids are
/// random, name-derived ids are deterministic within the directory, and any id
/// round-trips through its string encoding.
pub trait Directory: Send + Sync {
    /// Resolves an identity to the transport reaching that instance.
    fn get(&self, id: &ObjectId) -> Result<Arc<dyn Transport>>;

    fn new_unique_id(&self) -> ObjectId;

    fn id_from_name(&self, name: &str) -> ObjectId;

    fn id_from_string(&self, encoded: &str) -> Result<ObjectId>;
}

/// Directory backed by a map of registered in-process instances.
///
/// Serves tests and single-process deployments the way the in-memory
/// forwarder serves a cluster: transports are looked up directly instead of
/// crossing a network.
pub struct MemoryDirectory {
    namespace: Uuid,
    instances: RwLock<HashMap<ObjectId, Arc<dyn Transport>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v4())
    }

    /// Uses a fixed namespace so name-derived ids stay stable across
    /// processes.
    pub fn with_namespace(namespace: Uuid) -> Self {
        Self {
            namespace,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the transport serving one instance.
    pub fn register(&self, id: ObjectId, transport: Arc<dyn Transport>) -> Result<()> {
        self.instances.write()?.insert(id, transport);
        Ok(())
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory for MemoryDirectory {
    fn get(&self, id: &ObjectId) -> Result<Arc<dyn Transport>> {
        self.instances
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StateError::Transport(format!("no instance registered for id {id}")))
    }

    fn new_unique_id(&self) -> ObjectId {
        ObjectId::new_unique()
    }

    fn id_from_name(&self, name: &str) -> ObjectId {
        ObjectId::from_name(&self.namespace, name)
    }

    fn id_from_string(&self, encoded: &str) -> Result<ObjectId> {
        ObjectId::parse(encoded)
    }
}

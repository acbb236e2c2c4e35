use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{ObjectId, Result, StateError};
use crate::storage::Storage;

/// Reserved store key holding the set of persisted field names, so reload can
/// enumerate exactly what to re-read without scanning the whole store.
pub const PERSISTED_SET_KEY: &str = "__persisted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    NotStarted,
    Loaded,
}

/// Field storage and dirty/persisted bookkeeping for one durable object.
///
/// Values load lazily from the backing store on first use and only changed
/// fields flush back. Mutating access goes through [`DurableState::set`] or
/// the owning-aware [`FieldMut`] guard, which is what keeps the dirty set
/// accurate down to the top-level field even for deeply nested edits.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use durastate::{DurableState, MemoryStorage, ObjectId};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let storage = Arc::new(MemoryStorage::new());
/// let mut state = DurableState::new(ObjectId::new_unique(), storage);
///
/// state.set("counter", json!(1));
/// assert!(state.dirty().contains("counter"));
///
/// state.persist().await?;
/// assert!(state.dirty().is_empty());
/// # Ok::<(), durastate::StateError>(())
/// # }).unwrap();
/// ```
pub struct DurableState {
    id: ObjectId,
    storage: Arc<dyn Storage>,
    fields: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
    persisted: BTreeSet<String>,
    load: LoadState,
}

impl DurableState {
    pub fn new(id: ObjectId, storage: Arc<dyn Storage>) -> Self {
        Self {
            id,
            storage,
            fields: BTreeMap::new(),
            dirty: BTreeSet::new(),
            persisted: BTreeSet::new(),
            load: LoadState::NotStarted,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current in-memory value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assigns a field, marking it dirty only when the value actually changed.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.get(&name) {
            Some(existing) if *existing == value => {}
            _ => {
                self.fields.insert(name.clone(), value);
                self.dirty.insert(name);
            }
        }
    }

    /// Mutable access to a compound field through an owning-aware guard.
    ///
    /// The guard remembers which top-level field it belongs to, so an edit
    /// arbitrarily deep inside the value dirties that field and nothing else.
    pub fn get_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        let value = self.fields.get_mut(name)?;
        Some(FieldMut {
            key: name.to_string(),
            before: value.clone(),
            value,
            dirty: &mut self.dirty,
        })
    }

    pub fn dirty(&self) -> &BTreeSet<String> {
        &self.dirty
    }

    pub fn persisted(&self) -> &BTreeSet<String> {
        &self.persisted
    }

    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    /// Drops all dirty marks without writing anything.
    ///
    /// Useful after constructor-time defaults that should not flush on their
    /// own.
    pub fn mark_clean(&mut self) {
        self.dirty.clear();
    }

    /// Lazily loads persisted field values. Idempotent: after the first
    /// successful load this is a no-op, and a failed load resets the marker so
    /// a later call can retry.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.load == LoadState::Loaded {
            return Ok(());
        }
        match self.load_from_store().await {
            Ok(()) => {
                self.load = LoadState::Loaded;
                Ok(())
            }
            Err(err) => Err(StateError::Initialization(storage_detail(err))),
        }
    }

    async fn load_from_store(&mut self) -> Result<()> {
        let names: BTreeSet<String> = match self.storage.get(PERSISTED_SET_KEY).await? {
            Some(record) => serde_json::from_value(record)
                .map_err(|err| StateError::Storage(err.to_string()))?,
            None => BTreeSet::new(),
        };
        for name in &names {
            if let Some(value) = self.storage.get(name).await? {
                // Loaded values are not dirty; bypass set().
                self.fields.insert(name.clone(), value);
            }
        }
        debug!(id = %self.id, loaded = names.len(), "loaded persisted fields");
        self.persisted = names;
        Ok(())
    }

    /// Flushes every dirty field to the backing store.
    ///
    /// Fields flush one at a time and leave the dirty set as they succeed; a
    /// store failure mid-loop keeps already-flushed fields flushed and leaves
    /// the rest dirty. Persistence is not transactional across fields.
    pub async fn persist(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let mut persisted_changed = false;
        for name in self.dirty.clone() {
            let value = self.fields.get(&name).cloned().unwrap_or(Value::Null);
            self.storage
                .put(&name, value)
                .await
                .map_err(|err| StateError::Persistence(storage_detail(err)))?;
            self.dirty.remove(&name);
            if self.persisted.insert(name) {
                persisted_changed = true;
            }
        }
        if persisted_changed {
            let record = serde_json::to_value(&self.persisted)
                .map_err(|err| StateError::Persistence(err.to_string()))?;
            self.storage
                .put(PERSISTED_SET_KEY, record)
                .await
                .map_err(|err| StateError::Persistence(storage_detail(err)))?;
        }
        debug!(id = %self.id, persisted = self.persisted.len(), "flushed dirty fields");
        Ok(())
    }

    /// Clears every record for this instance from the backing store and
    /// empties the bookkeeping sets.
    pub async fn destroy(&mut self) -> Result<()> {
        self.storage
            .delete_all()
            .await
            .map_err(|err| StateError::Destruction(storage_detail(err)))?;
        self.dirty.clear();
        self.persisted.clear();
        debug!(id = %self.id, "destroyed object records");
        Ok(())
    }

    /// Plain snapshot of every field that is dirty or persisted, i.e. every
    /// user-defined field that has ever held a value.
    pub fn to_object(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| self.dirty.contains(*name) || self.persisted.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

fn storage_detail(err: StateError) -> String {
    match err {
        StateError::Storage(message) => message,
        other => other.to_string(),
    }
}

/// Mutable handle to one top-level field.
///
/// Dereferences to the raw JSON value; when the guard drops it compares the
/// value against the snapshot taken at borrow time and marks the owning field
/// dirty if anything inside changed.
pub struct FieldMut<'a> {
    key: String,
    before: Value,
    value: &'a mut Value,
    dirty: &'a mut BTreeSet<String>,
}

impl Deref for FieldMut<'_> {
    type Target = Value;

    fn deref(&self) -> &Value {
        self.value
    }
}

impl DerefMut for FieldMut<'_> {
    fn deref_mut(&mut self) -> &mut Value {
        self.value
    }
}

impl Drop for FieldMut<'_> {
    fn drop(&mut self) {
        if *self.value != self.before {
            self.dirty.insert(self.key.clone());
        }
    }
}

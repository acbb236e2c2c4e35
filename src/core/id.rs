use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, StateError};

/// Opaque identity addressing one durable object instance.
///
/// Fresh ids are random (v4); name-derived ids are deterministic (v5) within
/// a directory's namespace, so the same name always resolves to the same
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new_unique() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_name(namespace: &Uuid, name: &str) -> Self {
        Self(Uuid::new_v5(namespace, name.as_bytes()))
    }

    /// Parses the encoded form produced by `Display`.
    pub fn parse(encoded: &str) -> Result<Self> {
        Uuid::parse_str(encoded)
            .map(Self)
            .map_err(|_| StateError::BadId(encoded.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

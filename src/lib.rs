// ============================================================================
// durastate Library
// ============================================================================
//
// Transparent field-level persistence for stateful server-side objects:
// plain field reads and writes are tracked down to the owning top-level
// field, previously stored values load lazily on first use, and only changed
// fields flush back to the backing key-value store. Each object's fields and
// methods are reachable remotely through a uniform get/set/call protocol,
// with client-side stubs that make remote access read like local access.

pub mod core;
pub mod object;
pub mod router;
pub mod storage;
pub mod stub;
pub mod web;

// Re-export main types for convenience
pub use core::{ObjectId, Result, StateError};
pub use object::{Durable, DurableShape, DurableState, FieldMut, Member, ObjectShape};
pub use router::{Request, Response, Verb, dispatch};
pub use storage::{MemoryStorage, Storage};
pub use stub::{
    Directory, HttpTransport, LocalTransport, MemoryDirectory, Namespace, NamespaceBinding, Stub,
    Transport, bind, proxy_namespaces,
};

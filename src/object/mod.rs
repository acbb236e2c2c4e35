pub mod shape;
pub mod state;

pub use shape::{Member, ObjectShape};
pub use state::{DurableState, FieldMut, PERSISTED_SET_KEY};

use async_trait::async_trait;
use serde_json::Value;

/// A server-side object whose fields persist transparently.
///
/// Implementations pair a [`DurableState`] (field storage and bookkeeping)
/// with a declared [`ObjectShape`] and a dynamic method dispatcher. The access
/// router drives all three: it classifies member names through the shape,
/// reads and writes fields through the state, and routes `call` operations to
/// [`Durable::invoke`].
#[async_trait]
pub trait Durable: Send + Sync {
    /// Declared members of this type; must agree with
    /// [`DurableShape::shape`] where that is also implemented.
    fn shape(&self) -> ObjectShape;

    fn state(&self) -> &DurableState;

    fn state_mut(&mut self) -> &mut DurableState;

    /// Invokes a declared method with positional JSON arguments.
    ///
    /// The router only calls this for names the shape classifies as methods;
    /// any error is reported to the caller as a method invocation failure
    /// with the error's message as detail.
    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> anyhow::Result<Value>;
}

/// Compile-time member declaration, for contexts with no live instance.
///
/// The client-side binding helpers use this to build stubs from a type alone,
/// replacing runtime instantiation purely for shape inspection.
pub trait DurableShape {
    fn shape() -> ObjectShape;
}

//! Client-side stub generation.
//!
//! Given a directory of addressable instances and a type's declared shape, a
//! [`Namespace`] hands out [`Stub`]s whose members translate into protocol
//! requests: fields read through `/get`, synthesized setters write through
//! `/set`, and methods invoke through `/call`. Failure envelopes received
//! from the remote side are rebuilt into [`StateError`] values and returned
//! to the caller.

pub mod directory;
pub mod transport;

pub use directory::{Directory, MemoryDirectory};
pub use transport::{HttpTransport, LocalTransport, Transport};

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::core::{ObjectId, Result, StateError};
use crate::object::{DurableShape, Member, ObjectShape};
use crate::router::{Request, Response};

/// Client-side namespace bound to one durable object type.
///
/// Exposes the directory's identity operations unchanged and mints stubs for
/// resolved instances.
pub struct Namespace {
    directory: Arc<dyn Directory>,
    shape: ObjectShape,
}

impl Namespace {
    /// Validates the declared shape up front; a malformed declaration fails
    /// here, before any request is made.
    pub fn new(directory: Arc<dyn Directory>, shape: ObjectShape) -> Result<Self> {
        shape.validate().map_err(StateError::Config)?;
        Ok(Self { directory, shape })
    }

    /// Returns a stub bound to the addressed instance.
    pub fn get(&self, id: &ObjectId) -> Result<Stub> {
        Ok(Stub {
            id: *id,
            shape: self.shape.clone(),
            transport: self.directory.get(id)?,
        })
    }

    pub fn new_unique_id(&self) -> ObjectId {
        self.directory.new_unique_id()
    }

    pub fn id_from_name(&self, name: &str) -> ObjectId {
        self.directory.id_from_name(name)
    }

    pub fn id_from_string(&self, encoded: &str) -> Result<ObjectId> {
        self.directory.id_from_string(encoded)
    }

    pub fn shape(&self) -> &ObjectShape {
        &self.shape
    }
}

/// Remote handle whose member accesses become protocol requests.
pub struct Stub {
    id: ObjectId,
    shape: ObjectShape,
    transport: Arc<dyn Transport>,
}

impl Stub {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The raw transport, for callers that want the low-level protocol.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Reads a field's remote value.
    pub async fn get(&self, field: &str) -> Result<Value> {
        self.send(Request::get(format!("/get/{field}"))).await
    }

    /// Writes a field and returns the confirmed new value.
    pub async fn set(&self, field: &str, value: Value) -> Result<Value> {
        self.send(Request::post(
            format!("/set/{field}"),
            json!({ "value": value }),
        ))
        .await
    }

    /// Invokes a method with positional arguments.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.send(Request::post(
            format!("/call/{method}"),
            json!({ "args": args }),
        ))
        .await
    }

    /// Uniform member access driven by the capability map: declared methods
    /// invoke, declared fields read, synthesized `set<Field>` names write.
    /// Unknown names go out as reads so the remote reports the missing
    /// property itself.
    pub async fn member(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        match self.shape.classify(name) {
            Some(Member::Method) => self.call(name, args).await,
            Some(Member::Field) => self.get(name).await,
            None => match self.shape.setter_target(name) {
                Some(field) => {
                    let field = field.to_string();
                    let value = args.into_iter().next().ok_or(StateError::MissingValue)?;
                    self.set(&field, value).await
                }
                None => self.get(name).await,
            },
        }
    }

    async fn send(&self, request: Request) -> Result<Value> {
        unwrap_response(self.transport.send(request).await?)
    }
}

fn unwrap_response(response: Response) -> Result<Value> {
    if (200..300).contains(&response.status) {
        Ok(response.value().cloned().unwrap_or(Value::Null))
    } else {
        Err(StateError::from_envelope(&response.body).unwrap_or_else(|| {
            StateError::Remote {
                message: format!("remote call failed with status {}", response.status),
                details: String::new(),
            }
        }))
    }
}

/// One named directory paired with a durable type's declared shape.
pub struct NamespaceBinding {
    pub directory: Arc<dyn Directory>,
    pub shape: ObjectShape,
}

/// Pairs a directory with the shape of `T` for [`proxy_namespaces`].
pub fn bind<T: DurableShape>(directory: Arc<dyn Directory>) -> NamespaceBinding {
    NamespaceBinding {
        directory,
        shape: T::shape(),
    }
}

/// Replaces every binding's directory with a typed namespace proxy.
///
/// Validates each declared shape first and fails fast naming the offending
/// binding, before any request is made.
pub fn proxy_namespaces(
    bindings: HashMap<String, NamespaceBinding>,
) -> Result<HashMap<String, Namespace>> {
    let mut namespaces = HashMap::with_capacity(bindings.len());
    for (name, binding) in bindings {
        binding
            .shape
            .validate()
            .map_err(|detail| StateError::Config(format!("binding '{name}': {detail}")))?;
        let namespace = Namespace::new(binding.directory, binding.shape)?;
        namespaces.insert(name, namespace);
    }
    Ok(namespaces)
}

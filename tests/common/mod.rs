#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use durastate::{
    Durable, DurableShape, DurableState, MemoryStorage, ObjectId, ObjectShape, Storage,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Counter object used across the integration suites: two fields, one
/// mutating method, one pure method, and one method that always fails.
pub struct Counter {
    state: DurableState,
}

impl Counter {
    pub fn new(id: ObjectId, storage: Arc<dyn Storage>) -> Self {
        let mut state = DurableState::new(id, storage);
        state.set("counter", json!(1));
        state.set("objectLikeProp", json!([]));
        Self { state }
    }
}

impl DurableShape for Counter {
    fn shape() -> ObjectShape {
        ObjectShape::new()
            .field("counter")
            .field("objectLikeProp")
            .method("increment")
            .method("sayHello")
            .method("throws")
    }
}

#[async_trait]
impl Durable for Counter {
    fn shape(&self) -> ObjectShape {
        <Counter as DurableShape>::shape()
    }

    fn state(&self) -> &DurableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DurableState {
        &mut self.state
    }

    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        match method {
            "increment" => {
                let next = self.state.get("counter").and_then(Value::as_i64).unwrap_or(0) + 1;
                self.state.set("counter", json!(next));
                Ok(Value::Null)
            }
            "sayHello" => {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow::anyhow!("sayHello expects a name argument"))?;
                Ok(json!(format!("Hello {name}!")))
            }
            "throws" => Err(anyhow::anyhow!("Mistake")),
            other => Err(anyhow::anyhow!("unknown method {other}")),
        }
    }
}

/// Fresh counter plus a handle on its backing store.
pub fn counter() -> (Counter, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let counter = Counter::new(ObjectId::new_unique(), storage.clone());
    (counter, storage)
}

/// Counter behind the mutex the web and stub layers expect.
pub fn shared_counter() -> (Arc<Mutex<dyn Durable>>, Arc<MemoryStorage>) {
    let (counter, storage) = counter();
    (Arc::new(Mutex::new(counter)), storage)
}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::{Result, StateError};
use crate::object::Durable;
use crate::router::{self, Request, Response, Verb};

/// Raw protocol access to one addressed instance.
///
/// Stubs are built on top of this; callers that want the low-level protocol
/// rather than the convenience surface use it directly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one protocol request and returns the response envelope.
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Transport reaching a remote instance over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuses a caller-supplied client, e.g. one with custom timeouts.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = match &request.verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Other(name) => {
                let method = reqwest::Method::from_bytes(name.as_bytes())
                    .map_err(|err| StateError::Transport(err.to_string()))?;
                self.client.request(method, &url)
            }
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| StateError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let allow = response
            .headers()
            .get(reqwest::header::ALLOW)
            .and_then(|value| value.to_str().ok())
            .map(Verb::from_name);
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(Response {
            status,
            body,
            allow,
        })
    }
}

/// In-process transport: locks the target object and runs the dispatcher
/// directly, exercising the exact code path the HTTP surface does.
pub struct LocalTransport {
    object: Arc<Mutex<dyn Durable>>,
}

impl LocalTransport {
    pub fn new(object: Arc<Mutex<dyn Durable>>) -> Self {
        Self { object }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut object = self.object.lock().await;
        Ok(router::dispatch(&mut *object, &request).await)
    }
}

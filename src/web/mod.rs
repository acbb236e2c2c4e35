//! HTTP surface for durable objects.
//!
//! Adapts any inbound HTTP request into the uniform access envelope, runs the
//! router against the addressed instance, and renders the envelope back as an
//! HTTP response. The whole protocol lives in [`crate::router`]; this module
//! is only the axum glue.

use std::sync::Arc;

use axum::Router;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use http::header::ALLOW;
use tokio::sync::Mutex;
use tracing::warn;

use crate::object::Durable;
use crate::router::{self, Verb};

/// One durable object instance shared with the HTTP layer.
///
/// The mutex serializes invocations, which is what gives each instance its
/// single-writer execution model.
pub type SharedObject = Arc<Mutex<dyn Durable>>;

const BODY_LIMIT: usize = 1 << 20;

/// Builds an axum router exposing one durable object instance.
///
/// Every path and verb flows through the uniform dispatcher, so the generated
/// surface is exactly the protocol's: `GET /get/:name`, `POST /set/:name`,
/// `POST /call/:name`, and the documented failures for everything else.
pub fn serve(object: SharedObject) -> Router {
    Router::new().fallback(handle).with_state(object)
}

async fn handle(
    State(object): State<SharedObject>,
    request: axum::extract::Request,
) -> HttpResponse {
    let verb = Verb::from_name(request.method().as_str());
    let path = request.uri().path().to_string();
    let body = match to_bytes(request.into_body(), BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes).ok(),
        Ok(_) => None,
        Err(err) => {
            warn!(%path, error = %err, "failed to read request body");
            None
        }
    };

    let envelope = router::Request { verb, path, body };
    let mut object = object.lock().await;
    render(router::dispatch(&mut *object, &envelope).await)
}

fn render(response: router::Response) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut rendered = (status, axum::Json(response.body)).into_response();
    if let Some(allow) = response.allow {
        if let Ok(value) = allow.as_str().parse() {
            rendered.headers_mut().insert(ALLOW, value);
        }
    }
    rendered
}

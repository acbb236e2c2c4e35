//! Uniform access protocol: every field and method of a durable object is
//! reachable through exactly three routes, `/get/:name`, `/set/:name` and
//! `/call/:name`, with strict verb and body-shape validation.

use std::fmt;

use serde_json::{Value, json};
use tracing::debug;

use crate::core::{Result, StateError};
use crate::object::Durable;

/// Protocol verbs. Reads use GET, mutations use POST; anything else is only
/// ever rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Other(String),
}

impl Verb {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound protocol request: verb, `/<route>/<name>` path, optional JSON
/// body.
#[derive(Debug, Clone)]
pub struct Request {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            verb: Verb::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            verb: Verb::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Protocol response envelope: status code, JSON body, and the allowed verb
/// for method-not-allowed failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    pub allow: Option<Verb>,
}

impl Response {
    pub fn ok(value: Value) -> Self {
        Self {
            status: 200,
            body: json!({ "value": value }),
            allow: None,
        }
    }

    pub fn from_error(err: &StateError) -> Self {
        Self {
            status: err.status().unwrap_or(500),
            body: err.to_envelope(),
            allow: err.allow(),
        }
    }

    /// The `value` member of a success body.
    pub fn value(&self) -> Option<&Value> {
        self.body.get("value")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Get,
    Set,
    Call,
}

impl Route {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "get" => Some(Self::Get),
            "set" => Some(Self::Set),
            "call" => Some(Self::Call),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Call => "call",
        }
    }

    fn allowed(self) -> Verb {
        match self {
            Self::Get => Verb::Get,
            Self::Set | Self::Call => Verb::Post,
        }
    }
}

/// Runs one request against an object and renders the uniform response.
///
/// The object initializes (lazily loading persisted fields) before the
/// operation runs, and flushes after it when any field became dirty, so a
/// successful response implies the store already reflects the change. No
/// failure escapes: everything renders into the error envelope.
pub async fn dispatch(object: &mut dyn Durable, request: &Request) -> Response {
    match run(object, request).await {
        Ok(value) => Response::ok(value),
        Err(err) => {
            debug!(path = %request.path, error = %err, "request failed");
            Response::from_error(&err)
        }
    }
}

async fn run(object: &mut dyn Durable, request: &Request) -> Result<Value> {
    object.state_mut().initialize().await?;
    let value = route(object, request).await?;
    if !object.state().dirty().is_empty() {
        object.state_mut().persist().await?;
    }
    Ok(value)
}

async fn route(object: &mut dyn Durable, request: &Request) -> Result<Value> {
    let segments: Vec<&str> = request
        .path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    let Some(route) = segments.first().and_then(|segment| Route::parse(segment)) else {
        return Err(StateError::RouteNotFound);
    };
    if request.verb != route.allowed() {
        return Err(StateError::VerbNotAllowed {
            verb: request.verb.clone(),
            route: route.name(),
            allow: route.allowed(),
        });
    }
    let &[_, name] = segments.as_slice() else {
        return Err(StateError::RouteNotFound);
    };

    match route {
        Route::Get => get_member(object, name),
        Route::Set => set_member(object, name, request.body.as_ref()),
        Route::Call => call_member(object, name, request.body.as_ref()).await,
    }
}

fn get_member(object: &dyn Durable, name: &str) -> Result<Value> {
    if object.shape().is_method(name) {
        return Err(StateError::GetMethod(name.to_string()));
    }
    object
        .state()
        .get(name)
        .cloned()
        .ok_or_else(|| StateError::PropertyNotFound(name.to_string()))
}

fn set_member(object: &mut dyn Durable, name: &str, body: Option<&Value>) -> Result<Value> {
    let value = body
        .and_then(|body| body.get("value"))
        .cloned()
        .ok_or(StateError::MissingValue)?;
    if object.shape().is_method(name) {
        return Err(StateError::SetMethod(name.to_string()));
    }
    object.state_mut().set(name, value.clone());
    Ok(value)
}

async fn call_member(
    object: &mut dyn Durable,
    name: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let args = body
        .and_then(|body| body.get("args"))
        .and_then(Value::as_array)
        .cloned()
        .ok_or(StateError::MissingArgs)?;
    if !object.shape().is_method(name) {
        return Err(StateError::CallProperty(name.to_string()));
    }
    object
        .invoke(name, args)
        .await
        .map_err(|err| StateError::MethodFailed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_render_and_parse_by_name() {
        assert_eq!(Verb::from_name("GET"), Verb::Get);
        assert_eq!(Verb::from_name("POST"), Verb::Post);
        assert_eq!(Verb::from_name("PUT"), Verb::Other("PUT".to_string()));
        assert_eq!(Verb::Other("PUT".to_string()).to_string(), "PUT");
    }

    #[test]
    fn success_envelope_wraps_the_value() {
        let response = Response::ok(json!(5));
        assert_eq!(response.status, 200);
        assert_eq!(response.value(), Some(&json!(5)));
        assert_eq!(response.allow, None);
    }

    #[test]
    fn error_envelope_carries_status_and_allow() {
        let response = Response::from_error(&StateError::VerbNotAllowed {
            verb: Verb::Get,
            route: "call",
            allow: Verb::Post,
        });
        assert_eq!(response.status, 405);
        assert_eq!(response.allow, Some(Verb::Post));
        assert_eq!(
            response.body,
            json!({ "errors": [{ "message": "Cannot GET /call", "details": "" }] })
        );
    }
}

use serde_json::{Value, json};
use thiserror::Error;

use crate::router::Verb;

/// Structured failure type shared by the object model, the access protocol
/// router and the remote stubs.
///
/// Every variant renders into the uniform failure envelope
/// `{ "errors": [{ "message", "details" }] }`. Protocol-facing variants carry
/// an HTTP status; verb mismatches additionally carry the single allowed verb.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Property {0} does not exist")]
    PropertyNotFound(String),

    #[error("Cannot get method {0}")]
    GetMethod(String),

    #[error("Cannot set method {0}")]
    SetMethod(String),

    #[error("Cannot call property {0}")]
    CallProperty(String),

    #[error("Unknown value")]
    MissingValue,

    #[error("Unknown arguments")]
    MissingArgs,

    #[error("Problem while calling method")]
    MethodFailed(String),

    #[error("Not found")]
    RouteNotFound,

    #[error("Cannot {verb} /{route}")]
    VerbNotAllowed {
        verb: Verb,
        route: &'static str,
        allow: Verb,
    },

    #[error("Problem while initializing object")]
    Initialization(String),

    #[error("Problem while persisting object")]
    Persistence(String),

    #[error("Problem while destroying object")]
    Destruction(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid object id '{0}'")]
    BadId(String),

    /// A failure envelope received from a remote instance, rebuilt client-side.
    #[error("{message}")]
    Remote { message: String, details: String },
}

pub type Result<T> = std::result::Result<T, StateError>;

impl StateError {
    /// Human-readable detail string, empty when the variant carries none.
    pub fn details(&self) -> String {
        match self {
            Self::GetMethod(name) | Self::SetMethod(name) => {
                format!("Try POST /call/{name}")
            }
            Self::CallProperty(name) => format!("Try GET /get/{name}"),
            Self::MissingValue => "Request body should be: { \"value\": <new value> }".to_string(),
            Self::MissingArgs => {
                "Request body should be: { \"args\": [<arg1>, <arg2>, ...] }".to_string()
            }
            Self::MethodFailed(detail)
            | Self::Initialization(detail)
            | Self::Persistence(detail)
            | Self::Destruction(detail) => detail.clone(),
            Self::Remote { details, .. } => details.clone(),
            _ => String::new(),
        }
    }

    /// Protocol status code, when the failure maps onto one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::PropertyNotFound(_)
            | Self::SetMethod(_)
            | Self::CallProperty(_)
            | Self::RouteNotFound => Some(404),
            Self::GetMethod(_) | Self::MissingValue | Self::MissingArgs => Some(400),
            Self::VerbNotAllowed { .. } => Some(405),
            Self::MethodFailed(_)
            | Self::Initialization(_)
            | Self::Persistence(_)
            | Self::Destruction(_) => Some(500),
            _ => None,
        }
    }

    /// The single verb a method-not-allowed response permits.
    pub fn allow(&self) -> Option<Verb> {
        match self {
            Self::VerbNotAllowed { allow, .. } => Some(allow.clone()),
            _ => None,
        }
    }

    /// Renders the uniform failure envelope body.
    pub fn to_envelope(&self) -> Value {
        json!({
            "errors": [{
                "message": self.to_string(),
                "details": self.details(),
            }]
        })
    }

    /// Rebuilds a failure from an envelope body received over the wire.
    ///
    /// Only message and details survive the trip; callers branch on those.
    pub fn from_envelope(body: &Value) -> Option<Self> {
        let first = body.get("errors")?.as_array()?.first()?;
        Some(Self::Remote {
            message: first.get("message")?.as_str()?.to_string(),
            details: first
                .get("details")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl<T> From<std::sync::PoisonError<T>> for StateError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

pub mod error;
pub mod id;

pub use error::{Result, StateError};
pub use id::ObjectId;

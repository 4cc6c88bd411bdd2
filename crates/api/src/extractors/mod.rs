//! Custom Axum extractors.

pub mod caller;
pub mod optional_json;

pub use caller::Caller;
pub use optional_json::OptionalJson;

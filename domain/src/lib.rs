//! Domain operations of the chat gateway.
//!
//! `chat` holds the publish and subscribe operations the web layer calls, and
//! `gateway` holds the HTTP client for the external pub/sub service. Errors from
//! either are translated into `error::Error` so that `web` never depends on
//! `reqwest` directly.

pub mod chat;
pub mod error;

pub mod gateway;

pub use gateway::pubsub::{MessageStream, PublishRequest};

//! Server-Sent Events (SSE) relay for pub/sub subscriptions.
//!
//! This crate copies a long-lived upstream byte stream (the pub/sub service's
//! subscribe response) to a browser client as event-stream records.
//!
//! # Architecture
//!
//! - **One session per subscriber**: each `GET /receive` spawns a session task
//!   that owns the upstream stream exclusively. Nothing is shared between
//!   sessions.
//! - **Single-slot handoff**: the session reads one upstream chunk, hands its
//!   record(s) to the response body through a channel of capacity one, and only
//!   then reads again. Records arrive in upstream order.
//! - **Disconnect watcher**: a second task per session waits for the client to
//!   go away and closes the upstream. The session awaits it before finishing.
//! - **Close-once upstream**: the relay loop and the watcher race to close the
//!   upstream; [`connection::UpstreamCloser`] makes the second close a no-op.
//!
//! # Session Flow
//!
//! 1. Web layer opens the upstream subscribe request
//! 2. [`Relay::subscribe`] spawns the session and returns a [`relay::RecordStream`]
//! 3. The record stream becomes the response body
//! 4. Session ends on upstream EOF/error, or when the serving layer drops the
//!    body (client disconnect)
//!
//! # Example
//!
//! ```rust,ignore
//! use sse::{Relay, relay::RelayConfig};
//!
//! let subscription = Relay::new(RelayConfig::default()).subscribe(topic, upstream);
//! let body = axum::body::Body::from_stream(subscription.records);
//! ```
//!
//! # Modules
//!
//! - `connection`: session ids, the close-once upstream guard and the client disconnect signal
//! - `message`: event-stream record framing
//! - `relay`: the session loop and disconnect watcher

pub mod connection;
pub mod message;
pub mod relay;

pub use message::Framing;
pub use relay::Relay;

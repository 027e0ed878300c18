//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the subscription endpoint.
//! The relay itself (session loop, disconnect watcher, record framing) lives in
//! the `sse` crate.

pub mod handler;

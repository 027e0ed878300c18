//! Clients for services the gateway talks to over HTTP.

pub mod pubsub;

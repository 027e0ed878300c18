//! This module holds typed parameters for the gateway's endpoint inputs.
//!
//! By using typed parameters, we can ensure that the inputs are validated (by type) and
//! correctly formatted before they are handed to the domain layer.

pub(crate) mod message;
pub(crate) mod subscription;

//! Error types for the `domain` layer.
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur while relaying a request.
/// The `source` field holds the original error (usually a `reqwest::Error`) that caused
/// the domain error. `web` turns the `error_kind` into an HTTP status code and a
/// plain-text body, and never needs to know about `reqwest` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Errors raised before any call to the pub/sub service is made.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Client input was rejected; the string is the client-facing reason.
    Invalid(String),
    Other(String),
}

/// Errors that come from talking to the pub/sub service.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The service could not be reached or the connection failed.
    Network,
    /// The service answered with a non-success HTTP status.
    Status(u16),
}

impl Error {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Invalid(reason.into())),
        }
    }

    pub fn upstream_status(status: u16) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::Status(status)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Invalid(reason)) => {
                write!(f, "Invalid request: {reason}")
            }
            DomainErrorKind::External(ExternalErrorKind::Status(status)) => {
                write!(f, "Pub/sub service responded with status {status}")
            }
            DomainErrorKind::External(ExternalErrorKind::Network) => match &self.source {
                Some(source) => write!(f, "Pub/sub service unreachable: {source}"),
                None => write!(f, "Pub/sub service unreachable"),
            },
            kind => write!(f, "Domain Error: {kind:?}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance or a
        // request. This type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build pub/sub request".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Invalid(
                "Invalid JSON".to_string(),
            )),
        }
    }
}

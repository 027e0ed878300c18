use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Unique identifier for a subscription session (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Close-once handle for the upstream side of a session.
///
/// Both the relay loop and the disconnect watcher hold a clone. Whichever calls
/// [`UpstreamCloser::close`] first performs the close; every later call is a no-op.
#[derive(Debug, Clone, Default)]
pub struct UpstreamCloser {
    closed: Arc<AtomicBool>,
    token: CancellationToken,
}

impl UpstreamCloser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that actually closed the upstream.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once the upstream has been closed by either side.
    pub async fn closed(&self) {
        self.token.cancelled().await
    }
}

/// Fires [`DisconnectSignal`] when dropped.
///
/// Lives inside the response body stream, so the serving layer dropping the
/// body (client gone, or response finished) is what trips the signal.
#[derive(Debug)]
pub struct DisconnectGuard {
    _guard: DropGuard,
}

/// Observer side of the client connection.
#[derive(Debug, Clone)]
pub struct DisconnectSignal {
    token: CancellationToken,
}

impl DisconnectSignal {
    pub async fn disconnected(&self) {
        self.token.cancelled().await
    }

    pub fn is_disconnected(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Create a linked guard/signal pair for one client connection.
pub fn client_connection() -> (DisconnectGuard, DisconnectSignal) {
    let token = CancellationToken::new();
    let signal = DisconnectSignal {
        token: token.clone(),
    };
    (
        DisconnectGuard {
            _guard: token.drop_guard(),
        },
        signal,
    )
}

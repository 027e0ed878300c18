use crate::connection::{
    client_connection, DisconnectGuard, DisconnectSignal, SessionId, UpstreamCloser,
};
use crate::message::{Framer, Framing, DEFAULT_MAX_RECORD_SIZE, RECORD_OVERHEAD};
use async_stream::stream;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use log::*;
use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Records handed to the serving layer, already framed as `data: ...\n\n`.
pub type RecordStream = BoxStream<'static, Result<Bytes, Infallible>>;

type Upstream<E> = Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>;

#[derive(Debug, Clone, Copy)]
pub struct RelayConfig {
    pub framing: Framing,
    pub max_record_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            framing: Framing::Chunk,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }
}

/// Why a session stopped forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Upstream body reached EOF.
    UpstreamClosed,
    /// Upstream read returned an error.
    UpstreamFailed,
    /// The client went away and the watcher closed the upstream.
    ClientDisconnected,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub id: SessionId,
    pub topic: String,
    pub end: SessionEnd,
    pub records_sent: u64,
    /// Payload bytes forwarded, excluding record framing.
    pub bytes_sent: u64,
}

/// A live subscription: the records for the response body plus the session task.
pub struct Subscription {
    pub id: SessionId,
    pub records: RecordStream,
    pub session: JoinHandle<SessionReport>,
}

/// Spawns subscription sessions that copy an upstream byte stream to a client.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relay {
    config: RelayConfig,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Start relaying `upstream` for `topic`.
    ///
    /// Must be called from within a tokio runtime. The returned record stream
    /// owns the client side of the session: dropping it is treated as a client
    /// disconnect, which closes the upstream. The session task resolves once the
    /// relay loop and its disconnect watcher have both finished.
    pub fn subscribe<S, E>(&self, topic: impl Into<String>, upstream: S) -> Subscription
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let id = SessionId::new();
        let (tx, rx) = mpsc::channel(1);
        let (guard, client) = client_connection();

        let session = Session {
            id: id.clone(),
            topic: topic.into(),
            upstream: Box::pin(upstream),
            framer: Framer::new(self.config.framing, self.config.max_record_size),
            tx,
            closer: UpstreamCloser::new(),
            client,
            records_sent: 0,
            bytes_sent: 0,
        };

        debug!(
            "Starting session {} for topic {} ({} framing)",
            id, session.topic, self.config.framing
        );

        Subscription {
            id,
            records: record_stream(rx, guard),
            session: tokio::spawn(session.run()),
        }
    }
}

fn record_stream(mut rx: mpsc::Receiver<Bytes>, guard: DisconnectGuard) -> RecordStream {
    let records = stream! {
        // Dropped together with the body, which is how a client disconnect surfaces.
        let _guard = guard;
        while let Some(record) = rx.recv().await {
            yield Ok::<_, Infallible>(record);
        }
    };
    records.boxed()
}

struct Session<E> {
    id: SessionId,
    topic: String,
    upstream: Upstream<E>,
    framer: Framer,
    tx: mpsc::Sender<Bytes>,
    closer: UpstreamCloser,
    client: DisconnectSignal,
    records_sent: u64,
    bytes_sent: u64,
}

impl<E: Display + Send + 'static> Session<E> {
    async fn run(mut self) -> SessionReport {
        let watcher = tokio::spawn(watch_client(
            self.id.clone(),
            self.client.clone(),
            self.closer.clone(),
        ));

        let end = self.forward().await;

        let Session {
            id,
            topic,
            upstream,
            tx,
            closer,
            records_sent,
            bytes_sent,
            ..
        } = self;

        if closer.close() {
            debug!("Session {id} closing upstream after {end:?}");
        }
        drop(upstream);
        drop(tx);

        if let Err(e) = watcher.await {
            warn!("Disconnect watcher for session {id} did not finish cleanly: {e}");
        }

        info!(
            "Session {id} for topic {topic} ended ({end:?}): {records_sent} records, {bytes_sent} bytes"
        );

        SessionReport {
            id,
            topic,
            end,
            records_sent,
            bytes_sent,
        }
    }

    async fn forward(&mut self) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.closer.closed() => return SessionEnd::ClientDisconnected,
                next = self.upstream.next() => next,
            };

            let (records, end) = match next {
                Some(Ok(chunk)) => (self.framer.push(&chunk), None),
                Some(Err(e)) => {
                    debug!("Upstream read for session {} failed: {e}", self.id);
                    (self.framer.finish(), Some(SessionEnd::UpstreamFailed))
                }
                None => (self.framer.finish(), Some(SessionEnd::UpstreamClosed)),
            };

            if !self.send_all(records).await {
                return SessionEnd::ClientDisconnected;
            }
            if let Some(end) = end {
                return end;
            }
        }
    }

    /// Returns `false` once the client can no longer receive records.
    async fn send_all(&mut self, records: Vec<Bytes>) -> bool {
        for record in records {
            let payload_len = (record.len() - RECORD_OVERHEAD) as u64;
            tokio::select! {
                biased;
                _ = self.closer.closed() => return false,
                sent = self.tx.send(record) => {
                    if sent.is_err() {
                        return false;
                    }
                }
            }
            self.records_sent += 1;
            self.bytes_sent += payload_len;
        }
        true
    }
}

async fn watch_client(id: SessionId, client: DisconnectSignal, closer: UpstreamCloser) {
    tokio::select! {
        _ = client.disconnected() => {
            if closer.close() {
                info!("Client disconnected from session {id}, closing upstream");
            }
        }
        _ = closer.closed() => {}
    }
}

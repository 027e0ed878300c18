use anyhow::{Context, Result};
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub data: String,
}

/// One `GET /receive` subscription, read in the background.
pub struct Connection {
    pub label: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub fn establish(base_url: &str, topic: &str, label: String) -> Result<Self> {
        let url = reqwest::Url::parse_with_params(&format!("{}/receive", base_url), &[("topic", topic)])
            .context("Invalid base URL")?;
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(url.as_str())?.build();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        let event = Event { data: event.data };

                        if tx.send(event).is_err() {
                            debug!("SSE receiver dropped for {}", task_label);
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Comments carry no data
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", task_label, e);
                    }
                    None => {
                        debug!("SSE stream ended for {}", task_label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            event_rx: rx,
            handle,
        })
    }

    /// Wait for a record whose payload contains `needle`, skipping anything else.
    pub async fn wait_for(&mut self, needle: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for message: {}", needle);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if event.data.contains(needle) => {
                    return Ok(event);
                }
                Ok(Some(event)) => {
                    debug!("{} skipping unrelated record: {}", self.label, event.data);
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("SSE connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for message: {}", needle);
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

use crate::error::Error;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;

/// Raw bytes of a live subscription, as the pub/sub service writes them.
pub type MessageStream = BoxStream<'static, Result<Bytes, Error>>;

/// HTTP client for the external pub/sub service.
pub struct PubSubClient {
    client: reqwest::Client,
    base_url: String,
}

/// Request payload for `POST {base}/publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub topic: String,
    pub message: String,
}

impl PubSubClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(client, config.pubsub_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Publish one message. Any non-2xx answer is reported with its status code.
    pub async fn publish(&self, request: &PublishRequest) -> Result<(), Error> {
        let url = format!("{}/publish", self.base_url);

        debug!("Publishing to topic {} via {url}", request.topic);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach pub/sub service at {url}: {e}");
                Error::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Pub/sub publish rejected: {status} - {error_text}");
            Err(Error::upstream_status(status.as_u16()))
        }
    }

    /// Open a subscription and return its body as a byte stream.
    ///
    /// Resolves once the service has answered with headers; the stream then
    /// yields chunks as they arrive until the service closes the response.
    pub async fn subscribe(&self, topic: &str) -> Result<MessageStream, Error> {
        let url = format!("{}/subscribe", self.base_url);

        debug!("Subscribing to topic {topic} via {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("topic", topic)])
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach pub/sub service at {url}: {e}");
                Error::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Pub/sub subscribe to {topic} rejected: {status}");
            return Err(Error::upstream_status(status.as_u16()));
        }

        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }
}

//! Publish and subscribe operations used by the web controllers.

use crate::error::Error;
use crate::gateway::pubsub::{MessageStream, PubSubClient, PublishRequest};
use log::*;
use service::AppState;

/// Forward a chat message to the pub/sub service.
pub async fn publish(app_state: &AppState, request: PublishRequest) -> Result<(), Error> {
    let client = PubSubClient::from_config(&app_state.config, app_state.http_client().clone());
    client.publish(&request).await?;

    debug!("Published message to topic {}", request.topic);
    Ok(())
}

/// Open an upstream subscription for `topic`.
///
/// An empty topic is rejected before any connection to the pub/sub service is made.
pub async fn subscribe(app_state: &AppState, topic: &str) -> Result<MessageStream, Error> {
    if topic.is_empty() {
        return Err(Error::invalid("Missing topic"));
    }

    let client = PubSubClient::from_config(&app_state.config, app_state.http_client().clone());
    let messages = client.subscribe(topic).await?;

    info!("Subscribed to topic {topic}");
    Ok(messages)
}

use domain::PublishRequest;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /send`. Both fields are required; unknown fields are ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"topic": "general", "message": "Hello, world!"}))]
pub(crate) struct PublishParams {
    /// Topic (channel) the message is published to
    pub(crate) topic: String,
    /// Message text, forwarded unchanged
    pub(crate) message: String,
}

impl From<PublishParams> for PublishRequest {
    fn from(params: PublishParams) -> Self {
        PublishRequest {
            topic: params.topic,
            message: params.message,
        }
    }
}

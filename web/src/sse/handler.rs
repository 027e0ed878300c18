use crate::params::subscription::SubscribeParams;
use crate::{AppState, Error};
use ::sse::Relay;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use domain::chat;
use log::*;

/// GET a live event stream of the messages published to a topic.
///
/// The upstream subscription is opened before any headers are sent, so a bad topic
/// or an unreachable pub/sub service still gets a proper error status. After that
/// the response stays open until either side disconnects.
#[utoipa::path(
    get,
    path = "/receive",
    params(SubscribeParams),
    responses(
        (status = 200, description = "Stream of `data: <chunk>` event-stream records", content_type = "text/event-stream", body = String),
        (status = 400, description = "Missing topic"),
        (status = 500, description = "Pub/sub service unreachable"),
    )
)]
pub(crate) async fn receive(
    State(app_state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let topic = SubscribeParams::from(query).topic.unwrap_or_default();
    let upstream = chat::subscribe(&app_state, &topic).await?;

    let subscription = Relay::new(app_state.config.relay_config()).subscribe(topic, upstream);
    debug!("Establishing SSE session {}", subscription.id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(subscription.records),
    )
        .into_response())
}

use crate::params::message::PublishParams;
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use domain::chat;
use domain::error::Error as DomainError;
use log::*;

/// POST publish a chat message to a topic
#[utoipa::path(
    post,
    path = "/send",
    request_body = PublishParams,
    responses(
        (status = 200, description = "Message was accepted by the pub/sub service", body = String),
        (status = 400, description = "Body could not be read or is not valid JSON"),
        (status = 500, description = "Pub/sub service unreachable"),
    )
)]
pub async fn send(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, Error> {
    let body = body.map_err(|e| {
        warn!("Failed to read publish request body: {e}");
        DomainError::invalid("Cannot read body")
    })?;

    let params: PublishParams = serde_json::from_slice(&body).map_err(|e| {
        debug!("Rejecting publish request: {e}");
        DomainError::from(e)
    })?;

    debug!("POST /send to topic {}", params.topic);

    chat::publish(&app_state, params.into()).await?;

    Ok((StatusCode::OK, "Message sent successfully"))
}

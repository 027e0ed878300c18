//! HTTP surface of the chat gateway: routes, controllers, CORS and error mapping.

use log::*;
use tokio::net::TcpListener;

pub use error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod middleware;
mod params;
pub mod router;
mod sse;

/// Binds the configured interface and port and serves requests until the process exits.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = app_state.config.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await?;

    info!("ChatApp gateway running on {listen_addr}");

    axum::serve(listener, router::define_routes(app_state)).await
}

use config::Config;
use log::info;

pub mod config;
pub mod logging;

/// Builds the pooled HTTP client used for every call to the pub/sub service.
///
/// No request timeout is set: subscribe responses are expected to stay open
/// for as long as the browser client does.
pub fn init_http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    info!("Pub/sub service configured at {}", config.pubsub_url());

    reqwest::Client::builder()
        .use_rustls_tls()
        .user_agent(concat!("chatapp_gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    http_client: reqwest::Client,
}

impl AppState {
    pub fn new(app_config: Config, http_client: reqwest::Client) -> Self {
        Self {
            config: app_config,
            http_client,
        }
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}

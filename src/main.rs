use log::{error, info};
use service::{config::Config, logging::Logger, AppState};

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!(
        "Starting ChatApp gateway [pubsub: {}, framing: {}]",
        config.pubsub_url(),
        config.record_framing
    );

    let http_client = match service::init_http_client(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build pub/sub HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, http_client);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}

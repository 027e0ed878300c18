use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use sse::message::{Framing, DEFAULT_MAX_RECORD_SIZE};
use sse::relay::RelayConfig;

/// Default base URL of the pub/sub service used when `PUBSUB_URL` is not set.
pub const DEFAULT_PUBSUB_URL: &str = "http://localhost:8080";
const DEFAULT_INDEX_PATH: &str = "../chatapp-ui-frontend/index.html";
const DEFAULT_INTERFACE: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8081;

#[derive(Clone, Debug, PartialEq, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The base URL of the pub/sub service that messages are published to and
    /// subscribed from. Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_PUBSUB_URL)]
    pubsub_url: String,

    /// Path of the static chat UI page served at `/index`
    #[arg(long, env, default_value = DEFAULT_INDEX_PATH)]
    pub index_path: String,

    /// How upstream subscription bytes are cut into event-stream records:
    /// `chunk` forwards each upstream read as one record, `line` emits one
    /// record per newline-terminated message.
    #[arg(
        long,
        env,
        default_value_t = Framing::Chunk,
        value_parser = clap::builder::PossibleValuesParser::new(["CHUNK", "LINE", "chunk", "line"])
            .map(|s| s.parse::<Framing>().unwrap()),
    )]
    pub record_framing: Framing,

    /// Maximum number of payload bytes carried by a single event-stream record
    #[arg(long, env, default_value_t = DEFAULT_MAX_RECORD_SIZE,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub max_record_size: usize,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = DEFAULT_INTERFACE)]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    /// Built-in defaults only. Command line arguments, environment variables
    /// and `.env` are not consulted.
    fn default() -> Self {
        Self {
            pubsub_url: DEFAULT_PUBSUB_URL.to_string(),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            record_framing: Framing::Chunk,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            interface: Some(DEFAULT_INTERFACE.to_string()),
            port: DEFAULT_PORT,
            log_level_filter: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Returns the pub/sub base URL without a trailing slash.
    pub fn pubsub_url(&self) -> &str {
        self.pubsub_url.trim_end_matches('/')
    }

    pub fn set_pubsub_url(mut self, pubsub_url: impl Into<String>) -> Self {
        self.pubsub_url = pubsub_url.into();
        self
    }

    pub fn set_index_path(mut self, index_path: impl Into<String>) -> Self {
        self.index_path = index_path.into();
        self
    }

    pub fn set_record_framing(mut self, framing: Framing) -> Self {
        self.record_framing = framing;
        self
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or(DEFAULT_INTERFACE)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            framing: self.record_framing,
            max_record_size: self.max_record_size,
        }
    }
}

use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ConfigBuilder};

/// Dependencies whose log output is hidden unless running at Trace level.
/// hyper and reqwest in particular log every chunk of a long-lived subscription.
const FILTERED_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "tower", "tower_http", "axum", "mio"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the level chosen in `config`.
    ///
    /// Fails if a global logger has already been set.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = Self::convert_level_filter(config.log_level_filter);
        let log_config = Self::build_log_config(Self::should_filter_dependencies(
            config.log_level_filter,
        ));

        simplelog::TermLogger::init(
            level,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level < LevelFilter::Trace
    }

    /// RFC 3339 timestamps, with noisy dependencies dropped when `quiet_dependencies` is set.
    fn build_log_config(quiet_dependencies: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        builder.set_target_level(simplelog::LevelFilter::Debug);

        if quiet_dependencies {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "relay-test-client")]
#[command(about = "Publish/subscribe relay smoke testing tool")]
struct Cli {
    /// Base URL of the gateway (e.g., http://localhost:8081)
    #[arg(long)]
    base_url: String,

    /// Topic to use; a fresh random topic is generated when omitted
    #[arg(long)]
    topic: Option<String>,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Number of messages published by the ordering scenario
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Seconds to wait for each expected message
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Check /health and the CORS preflight without subscribing
    ConnectionTest,
    /// Publish one message and wait for it on two subscribers
    RoundTrip,
    /// Publish several messages and check they arrive in order
    Ordering,
    /// Run all scenarios
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let base_url = cli.base_url.trim_end_matches('/').to_string();
    let topic = cli
        .topic
        .clone()
        .unwrap_or_else(|| format!("relay-test-{}", uuid::Uuid::new_v4().simple()));
    let timeout = Duration::from_secs(cli.timeout_secs);
    let api = ApiClient::new(reqwest::Client::new(), base_url.clone());

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());
    println!("{} Gateway: {}", "→".blue(), base_url);
    println!("{} Topic: {}", "→".blue(), topic);

    let needs_subscribers = !matches!(cli.scenario, ScenarioChoice::ConnectionTest);
    let mut subscribers = Vec::new();
    if needs_subscribers {
        println!("\n{} Establishing SSE subscriptions...", "→".blue());
        subscribers.push(Connection::establish(&base_url, &topic, "Subscriber 1".to_string())?);
        subscribers.push(Connection::establish(&base_url, &topic, "Subscriber 2".to_string())?);
        // Give both subscriptions time to reach the pub/sub service before publishing
        tokio::time::sleep(Duration::from_millis(500)).await;
        println!("{} {} subscriptions established", "✓".green(), subscribers.len());
    }

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(&api).await?);
        }
        ScenarioChoice::RoundTrip => {
            results.push(scenarios::test_round_trip(&api, &topic, &mut subscribers, timeout).await?);
        }
        ScenarioChoice::Ordering => {
            results.push(
                scenarios::test_ordering(&api, &topic, &mut subscribers[0], cli.count, timeout)
                    .await?,
            );
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(&api).await?);
            results.push(scenarios::test_round_trip(&api, &topic, &mut subscribers, timeout).await?);
            results.push(
                scenarios::test_ordering(&api, &topic, &mut subscribers[0], cli.count, timeout)
                    .await?,
            );
        }
    }

    // Print summary
    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}

use colored::*;
use std::time::Duration;

use crate::sse_client::Event;

#[derive(Debug)]
pub struct TestResult {
    pub scenario: String,
    pub passed: bool,
    pub message: Option<String>,
    pub duration: Duration,
}

impl TestResult {
    pub fn pass(scenario: &str, duration: Duration) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: true,
            message: None,
            duration,
        }
    }

    pub fn fail(scenario: &str, message: String, duration: Duration) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: false,
            message: Some(message),
            duration,
        }
    }
}

pub fn print_event(label: &str, event: &Event) {
    println!(
        "   [{}] record received: {}",
        label.bright_blue().bold(),
        event.data.dimmed()
    );
}

pub fn print_test_summary(results: &[TestResult]) {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = total - passed;

    for result in results {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!("[{}] {} ({:?})", status, result.scenario, result.duration);

        if let Some(msg) = &result.message {
            println!("      {}", msg.dimmed());
        }
    }

    println!(
        "\n{}: {} passed, {} failed",
        "Results".bold(),
        passed.to_string().green(),
        failed.to_string().red()
    );
}

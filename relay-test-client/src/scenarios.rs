use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

/// The gateway answers `/health` and a CORS preflight on `/send`.
pub async fn test_connection(api: &ApiClient) -> Result<TestResult> {
    const NAME: &str = "Connection";
    let start = Instant::now();
    println!("\n{} Checking gateway health and CORS preflight...", "→".blue());

    let health = api.health().await?;
    if !health.is_success() {
        return Ok(TestResult::fail(
            NAME,
            format!("/health returned {}", health),
            start.elapsed(),
        ));
    }

    let (status, headers) = api.preflight("/send").await?;
    let has = |name: &str| headers.iter().any(|(n, _)| n == name);
    let missing: Vec<&str> = [
        "access-control-allow-origin",
        "access-control-allow-methods",
        "access-control-allow-headers",
    ]
    .into_iter()
    .filter(|name| !has(*name))
    .collect();

    if status.as_u16() != 200 || !missing.is_empty() {
        return Ok(TestResult::fail(
            NAME,
            format!("preflight returned {} missing {:?}", status, missing),
            start.elapsed(),
        ));
    }

    println!("{} Gateway healthy, preflight OK", "✓".green());
    Ok(TestResult::pass(NAME, start.elapsed()))
}

/// A single message published via `/send` arrives on every subscriber of the topic.
pub async fn test_round_trip(
    api: &ApiClient,
    topic: &str,
    subscribers: &mut [Connection],
    timeout: Duration,
) -> Result<TestResult> {
    const NAME: &str = "Round trip";
    let start = Instant::now();
    let marker = format!("round-trip-{}", uuid::Uuid::new_v4());

    println!("\n{} Publishing {} to {}...", "→".blue(), marker, topic);
    api.publish(topic, &marker).await?;

    for connection in subscribers.iter_mut() {
        match connection.wait_for(&marker, timeout).await {
            Ok(event) => print_event(&connection.label, &event),
            Err(e) => {
                return Ok(TestResult::fail(
                    NAME,
                    format!("{}: {}", connection.label, e),
                    start.elapsed(),
                ))
            }
        }
    }

    Ok(TestResult::pass(NAME, start.elapsed()))
}

/// `count` messages published back to back arrive in publish order.
pub async fn test_ordering(
    api: &ApiClient,
    topic: &str,
    connection: &mut Connection,
    count: usize,
    timeout: Duration,
) -> Result<TestResult> {
    const NAME: &str = "Ordering";
    let start = Instant::now();
    let run = uuid::Uuid::new_v4().simple().to_string();
    let markers: Vec<String> = (0..count).map(|i| format!("order-{}-{:04}", run, i)).collect();

    println!("\n{} Publishing {} messages to {}...", "→".blue(), count, topic);
    for marker in &markers {
        api.publish(topic, marker).await?;
    }

    // With chunk framing one record may carry several messages, so markers are
    // collected from every record rather than matched one record at a time.
    let prefix = format!("order-{}-", run);
    let mut received: Vec<String> = Vec::with_capacity(count);
    while received.len() < count {
        let event = match connection.wait_for(&prefix, timeout).await {
            Ok(event) => event,
            Err(e) => {
                return Ok(TestResult::fail(
                    NAME,
                    format!("message {} of {}: {}", received.len() + 1, count, e),
                    start.elapsed(),
                ))
            }
        };
        received.extend(markers_in(&event.data, &prefix));
    }

    if let Some((expected, got)) = markers.iter().zip(&received).find(|(m, r)| m != r) {
        return Ok(TestResult::fail(
            NAME,
            format!("expected {} but received {}", expected, got),
            start.elapsed(),
        ));
    }

    println!("{} {} messages received in order", "✓".green(), count);
    Ok(TestResult::pass(NAME, start.elapsed()))
}

/// Every `<prefix><digits>` token in `data`, in order of appearance.
fn markers_in(data: &str, prefix: &str) -> Vec<String> {
    data.match_indices(prefix)
        .map(|(at, _)| {
            let digits = data[at + prefix.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>();
            format!("{}{}", prefix, digits)
        })
        .collect()
}

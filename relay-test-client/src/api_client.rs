use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::json;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn health(&self) -> Result<StatusCode> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach /health")?;

        Ok(response.status())
    }

    /// Publish through the gateway's `POST /send`.
    pub async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&json!({
                "topic": topic,
                "message": message,
            }))
            .send()
            .await
            .context("Failed to reach /send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Publish failed with {}: {}", status, body.trim());
        }

        Ok(())
    }

    /// Send a CORS preflight and return the status plus the `Access-Control-*` headers.
    pub async fn preflight(&self, path: &str) -> Result<(StatusCode, Vec<(String, String)>)> {
        let response = self
            .client
            .request(Method::OPTIONS, format!("{}{}", self.base_url, path))
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .context("Failed to send preflight")?;

        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("access-control-"))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        Ok((response.status(), headers))
    }
}

///! Transport seam between the redundancy scheduler and the network
use anyhow::{Context, Result};
use async_trait::async_trait;
use icon_common::IconSet;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::ProviderConfig;
use super::query::IconsQuery;
use super::redundancy::AttemptOutcome;
use crate::module::icon_set::validate_icon_set;

const USER_AGENT: &str = concat!("icon-resolver/", env!("CARGO_PKG_VERSION"));

/// Error code the API returns for unknown prefixes
const API_NOT_FOUND: u64 = 404;

/// Performs one call against one host and classifies the result
///
/// The scheduler bounds every call with the provider timeout and cancels
/// `cancel` when another attempt wins. Implementations must not touch icon
/// storage; only the winning payload is ingested.
#[async_trait]
pub trait IconTransport: Send + Sync + 'static {
    async fn fetch(
        &self,
        host: &str,
        config: &ProviderConfig,
        query: &IconsQuery,
        cancel: CancellationToken,
    ) -> AttemptOutcome<IconSet>;
}

/// HTTP transport for the icon API
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_attempt(&self, url: &str) -> AttemptOutcome<IconSet> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Soft(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return AttemptOutcome::Hard(format!("HTTP {}", status));
        }
        if !status.is_success() {
            return AttemptOutcome::Soft(format!("HTTP {}", status));
        }

        let value: serde_json::Value = match response.json().await {
            Ok(value) => value,
            Err(e) if e.is_decode() => {
                return AttemptOutcome::Hard(format!("malformed response: {}", e));
            }
            Err(e) => return AttemptOutcome::Soft(format!("failed to read body: {}", e)),
        };

        classify_payload(value)
    }
}

/// Classify a decoded API body
///
/// The API answers with a bare number (its error code) instead of an icon
/// set. Only 404 means the prefix does not exist; any other code may clear
/// up on another host or a later try.
pub fn classify_payload(value: serde_json::Value) -> AttemptOutcome<IconSet> {
    if let Some(code) = value.as_u64() {
        return match code {
            API_NOT_FOUND => AttemptOutcome::Hard(format!("API error {}", code)),
            _ => AttemptOutcome::Soft(format!("API error {}", code)),
        };
    }

    match validate_icon_set(&value) {
        Ok(set) => AttemptOutcome::Success(set),
        Err(e) => AttemptOutcome::Hard(e.to_string()),
    }
}

#[async_trait]
impl IconTransport for HttpTransport {
    async fn fetch(
        &self,
        host: &str,
        config: &ProviderConfig,
        query: &IconsQuery,
        cancel: CancellationToken,
    ) -> AttemptOutcome<IconSet> {
        let url = query.url(host, config);
        debug!("GET {}", url);

        tokio::select! {
            _ = cancel.cancelled() => AttemptOutcome::Soft("cancelled".to_string()),
            outcome = self.fetch_attempt(&url) => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_error_code() {
        assert!(matches!(
            classify_payload(json!(404)),
            AttemptOutcome::Hard(_)
        ));
        assert!(matches!(
            classify_payload(json!(503)),
            AttemptOutcome::Soft(_)
        ));
        assert!(matches!(
            classify_payload(json!(0)),
            AttemptOutcome::Soft(_)
        ));
    }

    #[test]
    fn test_classify_malformed() {
        assert!(matches!(
            classify_payload(json!({ "icons": {} })),
            AttemptOutcome::Hard(_)
        ));
        assert!(matches!(
            classify_payload(json!("text")),
            AttemptOutcome::Hard(_)
        ));
    }

    #[test]
    fn test_classify_icon_set() {
        let payload = json!({
            "prefix": "mdi",
            "icons": { "home": { "body": "<path/>" } }
        });
        match classify_payload(payload) {
            AttemptOutcome::Success(set) => assert!(set.icons.contains_key("home")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_fetch_default_api() {
        let transport = HttpTransport::new().unwrap();
        let config = ProviderConfig::from_partial(
            &crate::module::api::config::PartialProviderConfig::with_resources([
                "https://api.iconify.design",
            ]),
        )
        .unwrap();
        let query = IconsQuery {
            provider: String::new(),
            prefix: "mdi".to_string(),
            icons: vec!["home".to_string()],
        };
        let outcome = transport
            .fetch("https://api.iconify.design", &config, &query, CancellationToken::new())
            .await;
        assert!(matches!(outcome, AttemptOutcome::Success(_)));
    }
}

//! Alert hooks forward high-severity log records to an external system.

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::observability::logger::{Level, LogRecord};
use std::time::Duration;
use tracing::warn;

/// Receives records at the levels it subscribes to
pub trait AlertHook: Send + Sync {
    /// Levels that trigger this hook
    fn levels(&self) -> &[Level] {
        &[Level::Error, Level::Fatal]
    }

    /// Handle one record. Must not block the logging call.
    fn fire(&self, record: &LogRecord);
}

/// Posts records as JSON to a webhook URL
pub struct WebhookHook {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl WebhookHook {
    pub fn new(url: &str) -> ToolkitResult<Self> {
        if url.is_empty() {
            return Err(ToolkitError::invalid_input("webhook url is empty"));
        }
        let url = reqwest::Url::parse(url)
            .map_err(|e| ToolkitError::invalid_input(format!("Invalid webhook url '{}': {}", url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl AlertHook for WebhookHook {
    /// Sends on the current tokio runtime; outside a runtime the alert is dropped.
    fn fire(&self, record: &LogRecord) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(url = %self.url, "No async runtime available, alert dropped");
                return;
            }
        };

        let body = record.to_value();
        let client = self.client.clone();
        let url = self.url.clone();

        handle.spawn(async move {
            let result = client
                .post(url.clone())
                .json(&body)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            if let Err(e) = result {
                warn!(url = %url, error = %e, "Failed to deliver alert");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_malformed_urls() {
        assert!(matches!(
            WebhookHook::new(""),
            Err(ToolkitError::InvalidInput { .. })
        ));
        assert!(matches!(
            WebhookHook::new("not a url"),
            Err(ToolkitError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_default_levels() {
        let hook = WebhookHook::new("http://localhost:9/alerts").unwrap();
        assert_eq!(hook.levels(), &[Level::Error, Level::Fatal]);
        assert_eq!(hook.url(), "http://localhost:9/alerts");
    }
}

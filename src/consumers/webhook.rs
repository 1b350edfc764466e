use crate::domain::model::{Delivery, ReadyFile};
use crate::domain::ports::Consumer;
use crate::utils::error::{HarnessError, Result};
use reqwest::Client;
use std::time::Duration;

/// 以 HTTP POST 通知 LOB 系統檔案已就緒。
/// LOB 端拿到路徑後自己取檔，檔案本身不經過網路。
#[derive(Debug, Clone)]
pub struct WebhookConsumer {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl WebhookConsumer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl Consumer for WebhookConsumer {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery> {
        let payload = serde_json::json!({
            "file": file.path.display().to_string(),
            "size_bytes": file.size,
            "forced": file.forced,
            "notified_at": chrono::Utc::now(),
        });

        tracing::debug!("📡 Notifying {} about {}", self.endpoint, file.path.display());

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HarnessError::ConsumerError {
                consumer: "webhook".to_string(),
                message: format!("endpoint returned {}", response.status()),
            });
        }

        Ok(Delivery::new("webhook", Some(self.endpoint.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn ready(path: &str, size: u64) -> ReadyFile {
        ReadyFile {
            path: path.into(),
            size,
            probe_attempts: 1,
            forced: false,
        }
    }

    #[tokio::test]
    async fn test_posts_file_metadata() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST)
                .path("/hook")
                .json_body_partial(r#"{"file": "/spool/job.pdf", "size_bytes": 2048}"#);
            then.status(200);
        });

        let consumer = WebhookConsumer::new(server.url("/hook"));
        let delivery = consumer.deliver(&ready("/spool/job.pdf", 2048)).await.unwrap();

        hook.assert();
        assert_eq!(delivery.consumer, "webhook");
        assert_eq!(delivery.destination.unwrap(), server.url("/hook"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_consumer_error() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST).path("/hook");
            then.status(503);
        });

        let consumer = WebhookConsumer::new(server.url("/hook"));
        let result = consumer.deliver(&ready("/spool/job.pdf", 10)).await;

        hook.assert();
        match result {
            Err(HarnessError::ConsumerError { message, .. }) => {
                assert!(message.contains("503"))
            }
            other => panic!("expected ConsumerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_http_error() {
        // 沒有人在聽的埠
        let consumer = WebhookConsumer::new("http://127.0.0.1:1/hook")
            .with_timeout(Duration::from_millis(500));
        let result = consumer.deliver(&ready("/spool/job.pdf", 10)).await;

        assert!(matches!(result, Err(HarnessError::HttpError(_))));
    }
}

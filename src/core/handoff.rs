use crate::core::readiness::ReadinessPoller;
use crate::domain::model::{Delivery, ReadyFile, SpoolFile};
use crate::domain::ports::{Consumer, HandOff};
use crate::utils::error::Result;

/// 標準交付管道：就緒輪詢 + consumer 交付
pub struct SpoolPipeline<C: Consumer> {
    poller: ReadinessPoller,
    consumer: C,
}

impl<C: Consumer> SpoolPipeline<C> {
    pub fn new(poller: ReadinessPoller, consumer: C) -> Self {
        Self { poller, consumer }
    }
}

#[async_trait::async_trait]
impl<C: Consumer> HandOff for SpoolPipeline<C> {
    async fn stabilize(&self, file: SpoolFile) -> Result<ReadyFile> {
        tracing::debug!("⏳ Waiting for {} to settle", file.path.display());
        self.poller.wait_ready(&file).await
    }

    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery> {
        self.consumer.deliver(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingConsumer {
        calls: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl Consumer for CountingConsumer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn deliver(&self, _file: &ReadyFile) -> Result<Delivery> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Delivery::new("counting", None))
        }
    }

    #[tokio::test]
    async fn test_pipeline_stabilizes_then_delivers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let pipeline = SpoolPipeline::new(
            ReadinessPoller::new(Duration::from_millis(10), 5),
            CountingConsumer {
                calls: Arc::clone(&calls),
            },
        );

        let file = SpoolFile::new(path, 8);
        let ready = pipeline.stabilize(file).await.unwrap();
        let delivery = pipeline.deliver(&ready).await.unwrap();

        assert_eq!(delivery.consumer, "counting");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

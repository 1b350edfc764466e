use crate::domain::model::{Delivery, DeliveryRecord, ReadyFile, SpoolFile};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn watch_dir(&self) -> &str;
    fn extensions(&self) -> &[String];
    fn poll_interval_ms(&self) -> u64;
    fn max_poll_attempts(&self) -> u32;
    fn require_stable_size(&self) -> bool;
    fn deliver_on_ceiling(&self) -> bool;
    fn rescan_interval_ms(&self) -> u64;
}

pub trait Journal: Send + Sync {
    fn record(
        &self,
        entry: &DeliveryRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Consumer: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery>;
}

#[async_trait]
pub trait HandOff: Send + Sync {
    async fn stabilize(&self, file: SpoolFile) -> Result<ReadyFile>;
    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery>;
}

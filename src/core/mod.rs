pub mod engine;
pub mod handoff;
pub mod readiness;
pub mod watcher;

pub use crate::domain::model::{Delivery, DeliveryRecord, ReadyFile, SpoolFile};
pub use crate::domain::ports::{ConfigProvider, Consumer, HandOff, Journal};
pub use crate::utils::error::Result;

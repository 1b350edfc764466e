pub mod config;
pub mod consumers;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::toml_config::HarnessConfig;
pub use crate::consumers::{CommandConsumer, FallbackChain, FolderConsumer, WebhookConsumer};
pub use crate::core::engine::HarnessEngine;
pub use crate::core::handoff::SpoolPipeline;
pub use crate::core::readiness::{CeilingPolicy, ReadinessPoller};
pub use crate::core::watcher::{DropFolderWatcher, WatchEventReceiver};
pub use crate::utils::error::{HarnessError, Result};
pub use crate::utils::journal::{CsvJournal, NullJournal};

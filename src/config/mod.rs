pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pdf-handoff")]
#[command(about = "Watch a spool folder for finished PDFs and hand them to a consumer")]
pub struct CliConfig {
    /// Spool folder to watch for new files
    #[arg(long, default_value = "./spool")]
    pub watch_dir: String,

    /// Destination folder the files are deposited into
    #[arg(long, default_value = "./delivered")]
    pub destination: String,

    /// File extensions to pick up
    #[arg(long, value_delimiter = ',', default_value = "pdf")]
    pub extensions: Vec<String>,

    /// Delay between readiness probes
    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,

    /// Probe ceiling per file
    #[arg(long, default_value = "20")]
    pub max_attempts: u32,

    /// Interval of the fallback directory re-scan
    #[arg(long, default_value = "2000")]
    pub rescan_interval_ms: u64,

    /// Skip the stable-size requirement (write-open probe only)
    #[arg(long)]
    pub no_stable_size: bool,

    /// Report failure instead of delivering when the probe ceiling is hit
    #[arg(long)]
    pub fail_on_ceiling: bool,

    /// Append one CSV row per hand-off to this file
    #[arg(long)]
    pub journal: Option<String>,

    /// Sweep the folder once and exit instead of watching
    #[arg(long)]
    pub once: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU/memory statistics")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn watch_dir(&self) -> &str {
        &self.watch_dir
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    fn max_poll_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn require_stable_size(&self) -> bool {
        !self.no_stable_size
    }

    fn deliver_on_ceiling(&self) -> bool {
        !self.fail_on_ceiling
    }

    fn rescan_interval_ms(&self) -> u64 {
        self.rescan_interval_ms
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("watch-dir", &self.watch_dir)?;
        validation::validate_path("destination", &self.destination)?;
        validation::validate_extension_list("extensions", &self.extensions)?;
        validation::validate_range("poll-interval-ms", self.poll_interval_ms, 10, 600_000)?;
        validation::validate_positive_number("max-attempts", self.max_attempts as usize, 1)?;
        validation::validate_range("rescan-interval-ms", self.rescan_interval_ms, 100, 3_600_000)?;

        if let Some(journal) = &self.journal {
            validation::validate_path("journal", journal)?;
        }

        Ok(())
    }
}

use crate::consumers::{CommandConsumer, FallbackChain, FolderConsumer, WebhookConsumer};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HarnessError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub harness: HarnessInfo,
    pub watch: WatchConfig,
    pub readiness: Option<ReadinessConfig>,
    pub delivery: DeliveryConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub directory: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    pub rescan_interval_ms: Option<u64>,
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    pub poll_interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub require_stable_size: Option<bool>,
    pub deliver_on_ceiling: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub journal_path: Option<String>,
    pub consumers: Vec<ConsumerSpec>,
}

/// `[[delivery.consumers]]` 的一層；依 `type` 決定需要哪些欄位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerSpec {
    pub r#type: String,
    pub destination: Option<String>,
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub system_stats: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_delivery_failure: Option<String>, // "continue", "stop"
}

impl HarnessConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HarnessError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HarnessError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SPOOL_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_path("watch.directory", &self.watch.directory)?;
        crate::utils::validation::validate_extension_list("watch.extensions", &self.watch.extensions)?;
        crate::utils::validation::validate_range(
            "readiness.poll_interval_ms",
            self.poll_interval_ms(),
            10,
            600_000,
        )?;
        crate::utils::validation::validate_positive_number(
            "readiness.max_attempts",
            self.max_attempts() as usize,
            1,
        )?;
        crate::utils::validation::validate_range(
            "watch.rescan_interval_ms",
            self.rescan_interval_ms(),
            100,
            3_600_000,
        )?;

        if self.delivery.consumers.is_empty() {
            return Err(HarnessError::MissingConfigError {
                field: "delivery.consumers".to_string(),
            });
        }

        for (index, spec) in self.delivery.consumers.iter().enumerate() {
            let field = format!("delivery.consumers[{}]", index);
            match spec.r#type.as_str() {
                "folder" => {
                    let destination = spec.destination.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.destination", field),
                        }
                    })?;
                    crate::utils::validation::validate_path(
                        &format!("{}.destination", field),
                        destination,
                    )?;
                }
                "command" => {
                    let program = spec.program.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.program", field),
                        }
                    })?;
                    crate::utils::validation::validate_non_empty_string(
                        &format!("{}.program", field),
                        program,
                    )?;
                }
                "webhook" => {
                    let endpoint = spec.endpoint.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.endpoint", field),
                        }
                    })?;
                    crate::utils::validation::validate_url(
                        &format!("{}.endpoint", field),
                        endpoint,
                    )?;
                }
                other => {
                    return Err(HarnessError::InvalidConfigValueError {
                        field: format!("{}.type", field),
                        value: other.to_string(),
                        reason: "Supported consumer types: folder, command, webhook".to_string(),
                    });
                }
            }
        }

        if let Some(error_handling) = &self.error_handling {
            if let Some(policy) = &error_handling.on_delivery_failure {
                if policy != "continue" && policy != "stop" {
                    return Err(HarnessError::InvalidConfigValueError {
                        field: "error_handling.on_delivery_failure".to_string(),
                        value: policy.clone(),
                        reason: "Supported policies: continue, stop".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// 依配置順序組出 consumer 後備鏈
    pub fn build_consumer_chain(&self) -> Result<FallbackChain> {
        let mut chain = FallbackChain::new();

        for (index, spec) in self.delivery.consumers.iter().enumerate() {
            let field = format!("delivery.consumers[{}]", index);
            match spec.r#type.as_str() {
                "folder" => {
                    let destination = spec.destination.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.destination", field),
                        }
                    })?;
                    chain = chain.push(FolderConsumer::new(destination));
                }
                "command" => {
                    let program = spec.program.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.program", field),
                        }
                    })?;
                    let mut consumer =
                        CommandConsumer::new(program, spec.args.clone().unwrap_or_default());
                    if let Some(seconds) = spec.timeout_seconds {
                        consumer = consumer.with_timeout(Duration::from_secs(seconds));
                    }
                    chain = chain.push(consumer);
                }
                "webhook" => {
                    let endpoint = spec.endpoint.as_deref().ok_or_else(|| {
                        HarnessError::MissingConfigError {
                            field: format!("{}.endpoint", field),
                        }
                    })?;
                    let mut consumer = WebhookConsumer::new(endpoint);
                    if let Some(seconds) = spec.timeout_seconds {
                        consumer = consumer.with_timeout(Duration::from_secs(seconds));
                    }
                    chain = chain.push(consumer);
                }
                other => {
                    return Err(HarnessError::InvalidConfigValueError {
                        field: format!("{}.type", field),
                        value: other.to_string(),
                        reason: "Supported consumer types: folder, command, webhook".to_string(),
                    });
                }
            }
        }

        Ok(chain)
    }

    /// 取得就緒探測間隔
    pub fn poll_interval_ms(&self) -> u64 {
        self.readiness
            .as_ref()
            .and_then(|r| r.poll_interval_ms)
            .unwrap_or(500)
    }

    /// 取得探測次數上限
    pub fn max_attempts(&self) -> u32 {
        self.readiness
            .as_ref()
            .and_then(|r| r.max_attempts)
            .unwrap_or(20)
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 取得重新掃描間隔
    pub fn rescan_interval_ms(&self) -> u64 {
        self.watch.rescan_interval_ms.unwrap_or(2000)
    }

    /// 交付日誌路徑，未設定表示不落盤
    pub fn journal_path(&self) -> Option<&str> {
        self.delivery.journal_path.as_deref()
    }

    /// 交付失敗時是否讓整個 harness 以失敗收場
    pub fn stop_on_delivery_failure(&self) -> bool {
        self.error_handling
            .as_ref()
            .and_then(|e| e.on_delivery_failure.as_deref())
            .map(|p| p == "stop")
            .unwrap_or(false)
    }
}

impl ConfigProvider for HarnessConfig {
    fn watch_dir(&self) -> &str {
        &self.watch.directory
    }

    fn extensions(&self) -> &[String] {
        &self.watch.extensions
    }

    fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms()
    }

    fn max_poll_attempts(&self) -> u32 {
        self.max_attempts()
    }

    fn require_stable_size(&self) -> bool {
        self.readiness
            .as_ref()
            .and_then(|r| r.require_stable_size)
            .unwrap_or(true)
    }

    fn deliver_on_ceiling(&self) -> bool {
        self.readiness
            .as_ref()
            .and_then(|r| r.deliver_on_ceiling)
            .unwrap_or(true)
    }

    fn rescan_interval_ms(&self) -> u64 {
        self.rescan_interval_ms()
    }
}

impl Validate for HarnessConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_harness_config() {
        let toml_content = r#"
[harness]
name = "invoice-handoff"
description = "Hand finished invoices to the archive"
version = "1.0.0"

[watch]
directory = "/var/spool/pdf"
extensions = ["pdf", "ps"]

[readiness]
poll_interval_ms = 250
max_attempts = 10

[delivery]
[[delivery.consumers]]
type = "folder"
destination = "/var/archive/pdf"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.harness.name, "invoice-handoff");
        assert_eq!(config.watch.directory, "/var/spool/pdf");
        assert_eq!(config.watch.extensions, vec!["pdf", "ps"]);
        assert_eq!(config.poll_interval_ms(), 250);
        assert_eq!(config.max_attempts(), 10);
        // 未設定的節沿用預設
        assert_eq!(config.rescan_interval_ms(), 2000);
        assert!(!config.monitoring_enabled());
        assert!(!config.stop_on_delivery_failure());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_SPOOL_DIR", "/tmp/test-spool");

        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "${TEST_SPOOL_DIR}"

[delivery]
[[delivery.consumers]]
type = "folder"
destination = "/tmp/out"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.watch.directory, "/tmp/test-spool");

        std::env::remove_var("TEST_SPOOL_DIR");
    }

    #[test]
    fn test_unknown_consumer_type_fails_validation() {
        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
[[delivery.consumers]]
type = "carrier-pigeon"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_consumers_fails_validation() {
        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
consumers = []
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(HarnessError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_webhook_endpoint_must_be_valid_url() {
        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
[[delivery.consumers]]
type = "webhook"
endpoint = "not-a-url"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_consumer_chain_preserves_order() {
        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
[[delivery.consumers]]
type = "command"
program = "lob-import"
args = ["--input", "{file}"]
timeout_seconds = 30

[[delivery.consumers]]
type = "webhook"
endpoint = "https://lob.example.com/hook"

[[delivery.consumers]]
type = "folder"
destination = "/tmp/fallback"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        let chain = config.build_consumer_chain().unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.layer_names(), vec!["command", "webhook", "folder"]);
    }

    #[test]
    fn test_invalid_delivery_failure_policy_is_rejected() {
        let toml_content = r#"
[harness]
name = "test"
description = "test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
[[delivery.consumers]]
type = "folder"
destination = "/tmp/out"

[error_handling]
on_delivery_failure = "explode"
"#;

        let config = HarnessConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[harness]
name = "file-test"
description = "File test"
version = "1.0"

[watch]
directory = "/tmp/spool"

[delivery]
journal_path = "/tmp/journal.csv"

[[delivery.consumers]]
type = "folder"
destination = "/tmp/out"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = HarnessConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.harness.name, "file-test");
        assert_eq!(config.journal_path(), Some("/tmp/journal.csv"));
    }
}

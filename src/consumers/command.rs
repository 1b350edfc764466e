use crate::domain::model::{Delivery, ReadyFile};
use crate::domain::ports::Consumer;
use crate::utils::error::{HarnessError, Result};
use std::time::Duration;

/// 把就緒檔案交給外部 LOB 程式：以子行程方式啟動，
/// 引數中的 `{file}` 佔位符會被替換成檔案路徑
#[derive(Debug, Clone)]
pub struct CommandConsumer {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandConsumer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait::async_trait]
impl Consumer for CommandConsumer {
    fn name(&self) -> &str {
        "command"
    }

    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery> {
        let file_arg = file.path.display().to_string();
        let rendered: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{file}", &file_arg))
            .collect();

        let mut command = tokio::process::Command::new(&self.program);
        command.args(&rendered);
        // 沒寫佔位符就把路徑附加在最後
        if !self.args.iter().any(|a| a.contains("{file}")) {
            command.arg(&file.path);
        }

        tracing::debug!("🚀 Launching {} {:?}", self.program, rendered);

        let output_future = command.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output_future)
                .await
                .map_err(|_| HarnessError::ConsumerError {
                    consumer: "command".to_string(),
                    message: format!("'{}' timed out after {:?}", self.program, limit),
                })?,
            None => output_future.await,
        }
        .map_err(|e| HarnessError::ConsumerError {
            consumer: "command".to_string(),
            message: format!("failed to launch '{}': {}", self.program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::ConsumerError {
                consumer: "command".to_string(),
                message: format!(
                    "'{}' exited with {} ({})",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(Delivery::new("command", Some(self.program.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ready(path: impl Into<std::path::PathBuf>) -> ReadyFile {
        ReadyFile {
            path: path.into(),
            size: 4,
            probe_attempts: 1,
            forced: false,
        }
    }

    #[tokio::test]
    async fn test_successful_command_with_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let consumer = CommandConsumer::new("cat", vec!["{file}".to_string()]);
        let delivery = consumer.deliver(&ready(&path)).await.unwrap();

        assert_eq!(delivery.consumer, "command");
        assert_eq!(delivery.destination.unwrap(), "cat");
    }

    #[tokio::test]
    async fn test_path_appended_without_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let consumer = CommandConsumer::new("cat", vec![]);
        assert!(consumer.deliver(&ready(&path)).await.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_consumer_error() {
        let consumer = CommandConsumer::new("cat", vec![]);
        let result = consumer.deliver(&ready("/nonexistent/missing.pdf")).await;

        match result {
            Err(HarnessError::ConsumerError { consumer, .. }) => assert_eq!(consumer, "command"),
            other => panic!("expected ConsumerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unlaunchable_program_is_a_consumer_error() {
        let consumer = CommandConsumer::new("definitely-not-a-real-binary-xyz", vec![]);
        let result = consumer.deliver(&ready("/tmp/whatever.pdf")).await;

        assert!(matches!(
            result,
            Err(HarnessError::ConsumerError { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_slow_handoff() {
        let consumer = CommandConsumer::new(
            "sh",
            vec!["-c".to_string(), "sleep 5 # {file}".to_string()],
        )
        .with_timeout(Duration::from_millis(100));
        let result = consumer.deliver(&ready("/tmp/whatever.pdf")).await;

        match result {
            Err(HarnessError::ConsumerError { message, .. }) => {
                assert!(message.contains("timed out"))
            }
            other => panic!("expected timeout error, got {:?}", other),
        }
    }
}

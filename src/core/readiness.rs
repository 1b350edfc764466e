use crate::domain::model::{ReadyFile, SpoolFile};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HarnessError, Result};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

/// 探測次數用完後的處置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingPolicy {
    /// 照樣交付 (best-effort)，`ReadyFile::forced` 標記為 true
    DeliverAnyway,
    /// 回報 `FileNotReadyError`
    Fail,
}

/// 檔案就緒輪詢器：以固定間隔探測，直到檔案不再被寫入或次數用完。
///
/// 一次探測成功的條件是檔案能以寫入模式開啟（PDF 驅動程式放掉 handle 的
/// 近似判斷），且啟用 `require_stable_size` 時，長度與上一次成功探測相同。
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    poll_interval: Duration,
    max_attempts: u32,
    require_stable_size: bool,
    ceiling_policy: CeilingPolicy,
}

impl ReadinessPoller {
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            poll_interval,
            max_attempts: max_attempts.max(1),
            require_stable_size: true,
            ceiling_policy: CeilingPolicy::DeliverAnyway,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms()),
            config.max_poll_attempts(),
        )
        .with_require_stable_size(config.require_stable_size())
        .with_ceiling_policy(if config.deliver_on_ceiling() {
            CeilingPolicy::DeliverAnyway
        } else {
            CeilingPolicy::Fail
        })
    }

    pub fn with_require_stable_size(mut self, require: bool) -> Self {
        self.require_stable_size = require;
        self
    }

    pub fn with_ceiling_policy(mut self, policy: CeilingPolicy) -> Self {
        self.ceiling_policy = policy;
        self
    }

    /// 等待檔案就緒；最多探測 `max_attempts` 次
    pub async fn wait_ready(&self, file: &SpoolFile) -> Result<ReadyFile> {
        let mut last_len: Option<u64> = None;

        for attempt in 1..=self.max_attempts {
            match Self::probe(&file.path) {
                Ok(len) => {
                    if !self.require_stable_size || last_len == Some(len) {
                        return Ok(ReadyFile {
                            path: file.path.clone(),
                            size: len,
                            probe_attempts: attempt,
                            forced: false,
                        });
                    }
                    tracing::debug!(
                        "⏳ {} still settling ({} -> {} bytes, attempt {}/{})",
                        file.path.display(),
                        last_len.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
                        len,
                        attempt,
                        self.max_attempts
                    );
                    last_len = Some(len);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(HarnessError::FileVanishedError {
                        path: file.path.display().to_string(),
                    });
                }
                Err(e) => {
                    // 還被別的程序握著
                    tracing::debug!(
                        "⏳ {} not ready (attempt {}/{}): {}",
                        file.path.display(),
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_len = None;
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        match self.ceiling_policy {
            CeilingPolicy::DeliverAnyway => {
                tracing::warn!(
                    "⚠️ {} never settled after {} attempts, delivering anyway",
                    file.path.display(),
                    self.max_attempts
                );
                let size = std::fs::metadata(&file.path)
                    .map(|m| m.len())
                    .unwrap_or(file.size);
                Ok(ReadyFile {
                    path: file.path.clone(),
                    size,
                    probe_attempts: self.max_attempts,
                    forced: true,
                })
            }
            CeilingPolicy::Fail => Err(HarnessError::FileNotReadyError {
                path: file.path.display().to_string(),
                attempts: self.max_attempts,
            }),
        }
    }

    // 探測一次：stat 取得長度，再以寫入模式開啟確認沒有人握著檔案
    fn probe(path: &Path) -> std::io::Result<u64> {
        let len = std::fs::metadata(path)?.len();
        OpenOptions::new().write(true).open(path)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    fn spool_file(path: &Path) -> SpoolFile {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        SpoolFile::new(path.to_path_buf(), size)
    }

    #[tokio::test]
    async fn test_static_file_ready_on_first_probe_without_stability() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("done.pdf");
        std::fs::write(&path, b"%PDF-1.7 content").unwrap();

        let poller = ReadinessPoller::new(Duration::from_millis(10), 5)
            .with_require_stable_size(false);

        let ready = tokio_test::assert_ok!(poller.wait_ready(&spool_file(&path)).await);
        assert_eq!(ready.probe_attempts, 1);
        assert!(!ready.forced);
        assert_eq!(ready.size, 16);
    }

    #[tokio::test]
    async fn test_stable_size_needs_two_probes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("done.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let poller = ReadinessPoller::new(Duration::from_millis(10), 5);

        let ready = poller.wait_ready(&spool_file(&path)).await.unwrap();
        assert_eq!(ready.probe_attempts, 2);
        assert!(!ready.forced);
    }

    #[tokio::test]
    async fn test_growing_file_waits_until_writer_stops() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("printing.pdf");
        std::fs::write(&path, b"%PDF-").unwrap();

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for _ in 0..8 {
                let mut f = std::fs::OpenOptions::new()
                    .append(true)
                    .open(&writer_path)
                    .unwrap();
                f.write_all(b"chunk").unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let poller = ReadinessPoller::new(Duration::from_millis(25), 50);
        let ready = poller.wait_ready(&spool_file(&path)).await.unwrap();
        writer.await.unwrap();

        assert!(!ready.forced);
        // 寫入結束後的穩定長度
        assert_eq!(ready.size, std::fs::metadata(&path).unwrap().len());
        assert!(ready.probe_attempts >= 2);
    }

    #[tokio::test]
    async fn test_ceiling_deliver_anyway_marks_forced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("endless.pdf");
        std::fs::write(&path, b"x").unwrap();

        // 寫入頻率遠高於探測間隔，長度永遠不穩定
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for _ in 0..100 {
                let mut f = std::fs::OpenOptions::new()
                    .append(true)
                    .open(&writer_path)
                    .unwrap();
                f.write_all(b"x").unwrap();
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
        });

        let poller = ReadinessPoller::new(Duration::from_millis(15), 3);
        let ready = poller.wait_ready(&spool_file(&path)).await.unwrap();
        writer.abort();

        assert!(ready.forced);
        assert_eq!(ready.probe_attempts, 3);
    }

    #[tokio::test]
    async fn test_ceiling_fail_policy_reports_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("endless.pdf");
        std::fs::write(&path, b"x").unwrap();

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for _ in 0..100 {
                let mut f = std::fs::OpenOptions::new()
                    .append(true)
                    .open(&writer_path)
                    .unwrap();
                f.write_all(b"x").unwrap();
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
        });

        let poller = ReadinessPoller::new(Duration::from_millis(15), 3)
            .with_ceiling_policy(CeilingPolicy::Fail);
        let result = poller.wait_ready(&spool_file(&path)).await;
        writer.abort();

        match result {
            Err(HarnessError::FileNotReadyError { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected FileNotReadyError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vanished_file_reports_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let file = spool_file(&path);
        std::fs::remove_file(&path).unwrap();

        let poller = ReadinessPoller::new(Duration::from_millis(10), 5);
        let result = poller.wait_ready(&file).await;

        assert!(matches!(
            result,
            Err(HarnessError::FileVanishedError { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_length_file_is_deliverable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();

        let poller = ReadinessPoller::new(Duration::from_millis(10), 5);
        let ready = poller.wait_ready(&spool_file(&path)).await.unwrap();
        assert_eq!(ready.size, 0);
        assert!(!ready.forced);
    }
}

use crate::domain::model::{Delivery, ReadyFile};
use crate::domain::ports::Consumer;
use crate::utils::error::{HarnessError, Result};
use std::path::{Path, PathBuf};

/// 把就緒檔案搬進固定的收件資料夾
#[derive(Debug, Clone)]
pub struct FolderConsumer {
    destination: PathBuf,
}

impl FolderConsumer {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    // 避免覆蓋既有檔案："report.pdf" → "report (1).pdf" → "report (2).pdf"
    fn unique_target(&self, file_name: &str) -> PathBuf {
        let candidate = self.destination.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let extension = Path::new(file_name).extension().and_then(|e| e.to_str());

        let mut counter = 1u32;
        loop {
            let name = match extension {
                Some(ext) => format!("{} ({}).{}", stem, counter, ext),
                None => format!("{} ({})", stem, counter),
            };
            let candidate = self.destination.join(name);
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[async_trait::async_trait]
impl Consumer for FolderConsumer {
    fn name(&self) -> &str {
        "folder"
    }

    async fn deliver(&self, file: &ReadyFile) -> Result<Delivery> {
        tokio::fs::create_dir_all(&self.destination).await?;

        let file_name = file
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HarnessError::ConsumerError {
                consumer: "folder".to_string(),
                message: format!("invalid file name: {}", file.path.display()),
            })?;
        let target = self.unique_target(file_name);

        // rename 跨檔案系統會失敗，退回 copy + remove
        if tokio::fs::rename(&file.path, &target).await.is_err() {
            tokio::fs::copy(&file.path, &target).await?;
            tokio::fs::remove_file(&file.path).await?;
        }

        tracing::debug!(
            "📁 Deposited {} as {}",
            file.path.display(),
            target.display()
        );
        Ok(Delivery::new(
            "folder",
            Some(target.display().to_string()),
        ))
    }
}

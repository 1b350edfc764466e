use crate::domain::model::DeliveryRecord;
use crate::domain::ports::Journal;
use crate::utils::error::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// 附加式 CSV 交付日誌，每次交付（成功或失敗）一列
#[derive(Debug, Clone)]
pub struct CsvJournal {
    path: PathBuf,
}

impl CsvJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Journal for CsvJournal {
    async fn record(&self, entry: &DeliveryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // 標頭只在檔案建立時寫一次
        let write_headers = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_headers)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;

        Ok(())
    }
}

/// 不落盤的日誌實作，未配置 journal_path 時使用
#[derive(Debug, Clone, Default)]
pub struct NullJournal;

impl Journal for NullJournal {
    async fn record(&self, _entry: &DeliveryRecord) -> Result<()> {
        Ok(())
    }
}

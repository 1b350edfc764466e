use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 在監看資料夾中偵測到的候選檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolFile {
    pub path: PathBuf,
    pub size: u64,
    pub detected_at: DateTime<Utc>,
}

impl SpoolFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            detected_at: Utc::now(),
        }
    }
}

/// 通過就緒檢查、可以交付的檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyFile {
    pub path: PathBuf,
    pub size: u64,
    /// 確認就緒所花費的探測次數
    pub probe_attempts: u32,
    /// 達到探測上限後仍強制交付 (best-effort)
    pub forced: bool,
}

/// 一次成功交付的結果
#[derive(Debug, Clone)]
pub struct Delivery {
    /// 完成交付的 consumer 名稱
    pub consumer: String,
    /// 交付目的地 (路徑、URL 或命令列)，若有
    pub destination: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(consumer: impl Into<String>, destination: Option<String>) -> Self {
        Self {
            consumer: consumer.into(),
            destination,
            completed_at: Utc::now(),
        }
    }
}

/// 寫入交付日誌的單筆記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub timestamp: DateTime<Utc>,
    pub file: String,
    pub consumer: String,
    pub outcome: String,
    pub probe_attempts: u32,
    pub detail: String,
}

impl DeliveryRecord {
    pub fn success(ready: &ReadyFile, delivery: &Delivery) -> Self {
        Self {
            timestamp: Utc::now(),
            file: ready.path.display().to_string(),
            consumer: delivery.consumer.clone(),
            outcome: if ready.forced {
                "delivered-forced".to_string()
            } else {
                "delivered".to_string()
            },
            probe_attempts: ready.probe_attempts,
            detail: delivery.destination.clone().unwrap_or_default(),
        }
    }

    pub fn failure(file: &std::path::Path, probe_attempts: u32, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            file: file.display().to_string(),
            consumer: String::new(),
            outcome: "failed".to_string(),
            probe_attempts,
            detail: detail.into(),
        }
    }
}

/// 引擎統計計數器（跨任務共享，原子遞增）
#[derive(Debug, Default)]
pub struct HarnessStats {
    pub detected: std::sync::atomic::AtomicU64,
    pub delivered: std::sync::atomic::AtomicU64,
    pub failed: std::sync::atomic::AtomicU64,
    pub skipped: std::sync::atomic::AtomicU64,
}

/// 某個時間點的統計快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub detected: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl HarnessStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        use std::sync::atomic::Ordering;
        StatsSnapshot {
            detected: self.detected.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

use crate::domain::model::SpoolFile;
use crate::utils::error::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// 監看後端丟出來的原始路徑事件
pub type WatchEventReceiver = mpsc::UnboundedReceiver<PathBuf>;

/// 監看 spool 資料夾的混合式偵測器：OS 事件為主，定期重新掃描補漏。
///
/// OS 事件在網路磁碟或大量寫入下會漏，所以引擎固定間隔再呼叫 `scan()`；
/// `seen` 集合保證同一路徑整個程序生命週期只會被提出一次。
pub struct DropFolderWatcher {
    dir: PathBuf,
    extensions: Vec<String>,
    seen: HashSet<PathBuf>,
    _watcher: RecommendedWatcher,
}

impl DropFolderWatcher {
    /// 在 `dir` 上註冊 OS 監看器，回傳偵測器與原始事件通道
    pub fn spawn(
        dir: impl Into<PathBuf>,
        extensions: &[String],
    ) -> Result<(Self, WatchEventReceiver)> {
        let dir = dir.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            // 接收端關閉表示引擎已停止，這裡安靜忽略
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::warn!("⚠️ Watch backend error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let extensions = extensions
            .iter()
            .map(|e| e.to_ascii_lowercase())
            .collect();

        Ok((
            Self {
                dir,
                extensions,
                seen: HashSet::new(),
                _watcher: watcher,
            },
            rx,
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 枚舉資料夾，回傳所有還沒見過、副檔名符合的一般檔案
    pub fn scan(&mut self) -> Result<Vec<SpoolFile>> {
        let mut candidates = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !self.matches(&path) || self.seen.contains(&path) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            self.seen.insert(path.clone());
            candidates.push(SpoolFile::new(path, metadata.len()));
        }

        Ok(candidates)
    }

    /// 把原始事件路徑套用同一套過濾規則；不符合或已見過回傳 None
    pub fn admit(&mut self, path: PathBuf) -> Option<SpoolFile> {
        if !self.matches(&path) || self.seen.contains(&path) {
            return None;
        }
        // 事件到達時檔案可能已經不在了
        let metadata = match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => return None,
        };
        self.seen.insert(path.clone());
        Some(SpoolFile::new(path, metadata.len()))
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want == &e.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

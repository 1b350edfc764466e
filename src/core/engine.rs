use crate::core::watcher::{DropFolderWatcher, WatchEventReceiver};
use crate::domain::model::{DeliveryRecord, HarnessStats, SpoolFile, StatsSnapshot};
use crate::domain::ports::{HandOff, Journal};
use crate::utils::error::{HarnessError, Result};
use crate::utils::monitor::SystemMonitor;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Harness 引擎：把監看器餵進來的候選檔案派工給交付管道。
///
/// 行程內唯一的共享狀態是 in-flight 表（路徑 → 進行中任務），
/// 同一路徑同時間最多一個任務；關閉時把所有任務中止，等同棄置 timer。
/// 單一檔案的失敗只記錄、寫日誌，不會讓監看迴圈停下來。
pub struct HarnessEngine<P: HandOff + 'static, J: Journal + 'static> {
    pipeline: Arc<P>,
    journal: Arc<J>,
    monitor: SystemMonitor,
    rescan_interval: Duration,
    inflight: Arc<Mutex<HashMap<PathBuf, AbortHandle>>>,
    stats: Arc<HarnessStats>,
}

impl<P: HandOff + 'static, J: Journal + 'static> HarnessEngine<P, J> {
    pub fn new(pipeline: P, journal: J, rescan_interval: Duration) -> Self {
        Self::new_with_monitoring(pipeline, journal, rescan_interval, false)
    }

    pub fn new_with_monitoring(
        pipeline: P,
        journal: J,
        rescan_interval: Duration,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            journal: Arc::new(journal),
            monitor: SystemMonitor::new(monitor_enabled),
            rescan_interval,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(HarnessStats::default()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// 目前 in-flight 表中的路徑數
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }

    /// 派工一個候選檔案。路徑已在處理中時跳過並回傳 false。
    pub fn dispatch(&self, file: SpoolFile) -> bool {
        let path = file.path.clone();

        // 持鎖到 insert 完成；任務結尾的 remove 會等在鎖上，順序因此不會反轉
        let mut table = self.inflight.lock().unwrap();
        if table.contains_key(&path) {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("⏭️ {} already in flight, skipping", path.display());
            return false;
        }

        self.stats.detected.fetch_add(1, Ordering::Relaxed);

        let pipeline = Arc::clone(&self.pipeline);
        let journal = Arc::clone(&self.journal);
        let stats = Arc::clone(&self.stats);
        let inflight = Arc::clone(&self.inflight);
        let task_path = path.clone();

        let handle = tokio::spawn(async move {
            process_file(pipeline, journal, stats, file).await;
            inflight.lock().unwrap().remove(&task_path);
        });
        table.insert(path, handle.abort_handle());

        true
    }

    /// 監看模式：啟動掃描 + OS 事件 + 定期重新掃描，直到收到關閉訊號
    pub async fn run(
        &self,
        mut watcher: DropFolderWatcher,
        mut events: WatchEventReceiver,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<StatsSnapshot> {
        tracing::info!(
            "👀 Watching {} (re-scan every {:?})",
            watcher.dir().display(),
            self.rescan_interval
        );
        self.monitor.log_stats("Startup");

        let mut rescan = tokio::time::interval(self.rescan_interval);
        rescan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("🛑 Shutdown requested");
                    break;
                }
                maybe_path = events.recv(), if events_open => match maybe_path {
                    Some(path) => {
                        if let Some(file) = watcher.admit(path) {
                            self.dispatch(file);
                        }
                    }
                    None => {
                        tracing::warn!("⚠️ Watch event channel closed, relying on re-scans only");
                        events_open = false;
                    }
                },
                // 第一個 tick 立即觸發，兼作啟動掃描
                _ = rescan.tick() => {
                    self.scan_and_dispatch(&mut watcher);
                    self.monitor.log_stats("Re-scan");
                }
            }
        }

        // 取消所有進行中的任務（棄置 timer）
        let aborted: Vec<PathBuf> = {
            let mut table = self.inflight.lock().unwrap();
            table
                .drain()
                .map(|(path, handle)| {
                    handle.abort();
                    path
                })
                .collect()
        };
        for path in &aborted {
            tracing::warn!("🛑 Aborted in-flight hand-off for {}", path.display());
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            "📊 Session totals - detected: {}, delivered: {}, failed: {}, skipped: {}",
            snapshot.detected,
            snapshot.delivered,
            snapshot.failed,
            snapshot.skipped
        );
        self.monitor.log_final_stats();
        Ok(snapshot)
    }

    /// 單次模式：掃描一輪，循序處理到完為止；回傳交付成功的數量
    pub async fn sweep(&self, watcher: &mut DropFolderWatcher) -> Result<usize> {
        println!("Sweeping {}...", watcher.dir().display());

        let files = watcher.scan()?;
        println!("Detected {} candidate file(s)", files.len());

        let before = self.stats.delivered.load(Ordering::Relaxed);
        for file in files {
            self.stats.detected.fetch_add(1, Ordering::Relaxed);
            process_file(
                Arc::clone(&self.pipeline),
                Arc::clone(&self.journal),
                Arc::clone(&self.stats),
                file,
            )
            .await;
        }
        let delivered = (self.stats.delivered.load(Ordering::Relaxed) - before) as usize;

        println!("Handed off {} file(s)", delivered);
        self.monitor.log_final_stats();
        Ok(delivered)
    }

    fn scan_and_dispatch(&self, watcher: &mut DropFolderWatcher) {
        match watcher.scan() {
            Ok(files) => {
                for file in files {
                    self.dispatch(file);
                }
            }
            Err(e) => tracing::warn!("⚠️ Spool scan failed: {}", e),
        }
    }
}

/// 單一檔案的完整處理：stabilize → deliver → journal。
/// 任何失敗都吞掉，只留下 log、日誌記錄與統計。
async fn process_file<P: HandOff, J: Journal>(
    pipeline: Arc<P>,
    journal: Arc<J>,
    stats: Arc<HarnessStats>,
    file: SpoolFile,
) {
    let path = file.path.clone();
    tracing::info!("📄 Processing {}", path.display());

    let ready = match pipeline.stabilize(file).await {
        Ok(ready) => ready,
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("⚠️ {} never became ready: {}", path.display(), e);
            let attempts = match &e {
                HarnessError::FileNotReadyError { attempts, .. } => *attempts,
                _ => 0,
            };
            record_or_warn(journal.as_ref(), DeliveryRecord::failure(&path, attempts, e.to_string())).await;
            return;
        }
    };

    match pipeline.deliver(&ready).await {
        Ok(delivery) => {
            stats.delivered.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                "✅ {} handed off via '{}'",
                ready.path.display(),
                delivery.consumer
            );
            record_or_warn(journal.as_ref(), DeliveryRecord::success(&ready, &delivery)).await;
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!("❌ Hand-off failed for {}: {}", ready.path.display(), e);
            record_or_warn(
                journal.as_ref(),
                DeliveryRecord::failure(&path, ready.probe_attempts, e.to_string()),
            )
            .await;
        }
    }
}

async fn record_or_warn<J: Journal>(journal: &J, entry: DeliveryRecord) {
    if let Err(e) = journal.record(&entry).await {
        tracing::warn!("⚠️ Failed to journal hand-off record: {}", e);
    }
}

use clap::Parser;
use pdf_handoff::domain::model::StatsSnapshot;
use pdf_handoff::domain::ports::Journal;
use pdf_handoff::utils::{logger, validation::Validate};
use pdf_handoff::{
    CliConfig, CsvJournal, DropFolderWatcher, FolderConsumer, HarnessEngine, NullJournal,
    ReadinessPoller, SpoolPipeline,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting pdf-handoff CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let outcome = match &config.journal {
        Some(path) => run_harness(&config, CsvJournal::new(path)).await,
        None => run_harness(&config, NullJournal).await,
    };

    match outcome {
        Ok(stats) => {
            tracing::info!("✅ Hand-off session finished");
            println!("✅ Hand-off session finished");
            println!(
                "📊 Detected: {}, delivered: {}, failed: {}, skipped: {}",
                stats.detected, stats.delivered, stats.failed, stats.skipped
            );
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Harness failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                pdf_handoff::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                pdf_handoff::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                pdf_handoff::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                pdf_handoff::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run_harness<J: Journal + 'static>(
    config: &CliConfig,
    journal: J,
) -> pdf_handoff::Result<StatsSnapshot> {
    // spool 資料夾不存在就先建起來
    std::fs::create_dir_all(&config.watch_dir)?;

    let poller = ReadinessPoller::from_config(config);
    let pipeline = SpoolPipeline::new(poller, FolderConsumer::new(&config.destination));
    let engine = HarnessEngine::new_with_monitoring(
        pipeline,
        journal,
        Duration::from_millis(config.rescan_interval_ms),
        config.monitor,
    );

    let (mut watcher, events) = DropFolderWatcher::spawn(&config.watch_dir, &config.extensions)?;

    if config.once {
        engine.sweep(&mut watcher).await?;
        Ok(engine.stats())
    } else {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            let _ = shutdown_tx.send(true);
        });
        engine.run(watcher, events, shutdown_rx).await
    }
}

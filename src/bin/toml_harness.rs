use clap::Parser;
use pdf_handoff::config::toml_config::HarnessConfig;
use pdf_handoff::domain::model::StatsSnapshot;
use pdf_handoff::domain::ports::{ConfigProvider, Journal};
use pdf_handoff::utils::{logger, validation::Validate};
use pdf_handoff::{
    CsvJournal, DropFolderWatcher, FallbackChain, HarnessEngine, NullJournal, ReadinessPoller,
    SpoolPipeline,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "toml-harness")]
#[command(about = "PDF hand-off harness driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "harness-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Sweep the spool folder once and exit instead of watching
    #[arg(long)]
    once: bool,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based hand-off harness");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match HarnessConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be handed off");
        perform_dry_run(&config)?;
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 依配置組出 consumer 後備鏈
    let chain = match config.build_consumer_chain() {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::info!("🔗 Consumer chain: {}", chain.layer_names().join(" -> "));

    let outcome = match config.journal_path() {
        Some(path) => {
            run_harness(&config, chain, CsvJournal::new(path), monitor_enabled, args.once).await
        }
        None => run_harness(&config, chain, NullJournal, monitor_enabled, args.once).await,
    };

    match outcome {
        Ok(stats) => {
            tracing::info!("✅ Hand-off session finished");
            println!("✅ Hand-off session finished");
            println!(
                "📊 Detected: {}, delivered: {}, failed: {}, skipped: {}",
                stats.detected, stats.delivered, stats.failed, stats.skipped
            );

            if stats.failed > 0 && config.stop_on_delivery_failure() {
                eprintln!("❌ {} file(s) failed to hand off", stats.failed);
                std::process::exit(2);
            }
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
    config: &HarnessConfig,
    chain: FallbackChain,
    journal: J,
    monitor_enabled: bool,
    once: bool,
) -> pdf_handoff::Result<StatsSnapshot> {
    std::fs::create_dir_all(config.watch_dir())?;

    let poller = ReadinessPoller::from_config(config);
    let pipeline = SpoolPipeline::new(poller, chain);
    let engine = HarnessEngine::new_with_monitoring(
        pipeline,
        journal,
        Duration::from_millis(config.rescan_interval_ms()),
        monitor_enabled,
    );

    let (mut watcher, events) =
        DropFolderWatcher::spawn(config.watch_dir(), config.extensions())?;

    if once {
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

fn display_config_summary(config: &HarnessConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Harness: {} v{}",
        config.harness.name, config.harness.version
    );
    println!("  Watch: {}", config.watch.directory);
    println!("  Extensions: {}", config.watch.extensions.join(", "));
    println!(
        "  Readiness: every {}ms, up to {} attempts",
        config.poll_interval_ms(),
        config.max_attempts()
    );

    let consumer_types: Vec<&str> = config
        .delivery
        .consumers
        .iter()
        .map(|c| c.r#type.as_str())
        .collect();
    println!("  Consumers: {}", consumer_types.join(" -> "));

    if let Some(journal) = config.journal_path() {
        println!("  Journal: {}", journal);
    }

    if args.once {
        println!("  Mode: single sweep");
    } else {
        println!(
            "  Mode: watch (re-scan every {}ms)",
            config.rescan_interval_ms()
        );
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &HarnessConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 監看資料夾分析
    println!("📂 Spool Folder Analysis:");
    println!("  Directory: {}", config.watch.directory);

    let spool = std::path::Path::new(&config.watch.directory);
    if spool.is_dir() {
        let mut matching = 0usize;
        let mut others = 0usize;
        for entry in std::fs::read_dir(spool)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| {
                    config
                        .watch
                        .extensions
                        .iter()
                        .any(|want| want.eq_ignore_ascii_case(e))
                })
                .unwrap_or(false);
            if matches {
                matching += 1;
            } else {
                others += 1;
            }
        }
        println!("  📄 {} file(s) would be picked up now", matching);
        if others > 0 {
            println!("  ⏭️ {} file(s) ignored (extension mismatch)", others);
        }
    } else {
        println!("  ⚠️ Directory does not exist yet; it will be created on startup");
    }

    // 交付層分析
    println!();
    println!("🔗 Consumer Chain:");
    for (index, spec) in config.delivery.consumers.iter().enumerate() {
        let detail = match spec.r#type.as_str() {
            "folder" => spec.destination.clone().unwrap_or_default(),
            "command" => spec.program.clone().unwrap_or_default(),
            "webhook" => spec.endpoint.clone().unwrap_or_default(),
            _ => String::new(),
        };
        println!("  {}. {} ({})", index + 1, spec.r#type, detail);
    }

    // 就緒策略分析
    println!();
    println!("⏳ Readiness Policy:");
    println!(
        "  Probe every {}ms, ceiling {} attempts",
        config.poll_interval_ms(),
        config.max_attempts()
    );
    if config.require_stable_size() {
        println!("  ✅ Stable-size check enabled");
    }
    if config.deliver_on_ceiling() {
        println!("  ⚠️ Ceiling policy: deliver anyway (best-effort)");
    } else {
        println!("  ❌ Ceiling policy: report failure");
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}

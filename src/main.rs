//! DEX Hedge Maker - Main Entry Point
//!
//! Tick-driven host loop around the reconciliation strategy.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use dex_hedge_maker::config::AppConfig;
use dex_hedge_maker::exchange::{DexClient, MarketGateway};
use dex_hedge_maker::strategy::{ReconciliationState, Strategy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// DEX Hedge Maker CLI
#[derive(Parser)]
#[command(name = "dex-hedge-maker")]
#[command(version, about = "Hedged limit-order market making on a DEX REST backend")]
struct Cli {
    /// Config file name (without extension), merged with DHM__* env vars
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    info!("==============================================");
    info!(
        "🚀 DEX Hedge Maker v{} - trading strategy executor",
        env!("CARGO_PKG_VERSION")
    );
    info!("==============================================");

    // Configuration errors are fatal: the strategy must not start.
    let config = AppConfig::load_from(&cli.config)?;

    let client = DexClient::new(&config.backend, &config.schedule)?;

    info!("Connecting to backend at {}", config.backend.url);
    info!(
        "Waiting {}s for backend start...",
        config.schedule.startup_delay_secs
    );
    tokio::time::sleep(Duration::from_secs(config.schedule.startup_delay_secs)).await;

    let settings = loop {
        match client.get_settings().await {
            Ok(settings) => break settings,
            Err(e) => {
                warn!(
                    error = %e,
                    "Backend is not available, retrying in {}s",
                    config.schedule.retry_delay_secs
                );
                tokio::time::sleep(Duration::from_secs(config.schedule.retry_delay_secs)).await;
            }
        }
    };

    info!("✅ Backend is available at {}", config.backend.url);
    info!("BACKEND CONFIGURATION:");
    info!(" > Version : {}", settings.version);
    info!(" > Backend : {}", settings.backend);
    info!(" > Revision: {}", settings.revision.as_deref().unwrap_or("-"));
    info!(" > Address : {}", settings.address);

    let client = client
        .with_own_address(settings.address)
        .with_order_limit(config.strategy.limit);

    let strategy = Strategy::from_config(config.strategy_kind, config.strategy.clone())?;
    info!("✅ Strategy is loaded, initialization done");

    // Shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    let mut state = ReconciliationState::default();
    let mut tick: u64 = 0;

    while !shutdown.load(Ordering::SeqCst) {
        tick += 1;
        let started = Utc::now();
        info!("==============================================");
        info!(tick, "⚙️  Invoking strategy...");

        match client.get_market_price(strategy.market_id()).await {
            Ok(price) => {
                info!(%price, "Current market price");
                state = strategy.execute(&client, state, price).await;
                info!(tick, "✅ Strategy execution finished");
            }
            Err(e) => {
                error!(error = %e, "Could not fetch market price, skipping tick");
            }
        }

        let elapsed = Utc::now() - started;
        info!(
            tick,
            elapsed_ms = elapsed.num_milliseconds(),
            "Tick finished"
        );

        if cli.once {
            break;
        }

        info!(
            "Waiting {}s until next execution...",
            config.schedule.execution_delay_secs
        );
        tokio::time::sleep(Duration::from_secs(config.schedule.execution_delay_secs)).await;
    }

    info!("Shutting down after {} ticks", tick);
    Ok(())
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // File appender for detailed logs
    let file_appender = tracing_appender::rolling::hourly("logs", "dex-hedge-maker.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(_guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dex_hedge_maker=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    Ok(())
}

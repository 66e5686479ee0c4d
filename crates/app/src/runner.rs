use crate::cli::{BackfillTarget, Command, SeedTarget};
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::time::{RealTimeProvider, TimeProvider};
use invsim_core::config::AppConfig;
use invsim_core::sink::port::UpsertSink;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::{AssetSource, HistorySource};
use invsim_feed::binance::BinanceSource;
use invsim_feed::catalog::{self, Catalog, CatalogSource};
use invsim_feed::fallback::FallbackSource;
use invsim_feed::frankfurter::FrankfurterSource;
use invsim_feed::tefas::TefasSource;
use invsim_feed::tradingview::{ScanKind, TradingViewSource};
use invsim_feed::yahoo::YahooSource;
use invsim_ingest::job::{BackfillJob, BackfillPlan, SeedJob};
use invsim_ingest::report::RunSummary;
use invsim_ingest::writer::{FallbackPolicy, SinkWriter};
use invsim_sink::memory::MemorySink;
use invsim_sink::rest::RestSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// # Summary
/// 组装并执行一次命令。
///
/// # Logic
/// 1. 选择写入端：dry-run 使用内存表，否则使用 REST 后端。
/// 2. 按命令装配数据源与任务。
/// 3. 执行任务并返回汇总。
///
/// # Returns
/// 只有在组件构造失败时返回错误；任务本身总是运行到结束。
pub async fn run(command: &Command, config: &AppConfig, dry_run: bool) -> anyhow::Result<RunSummary> {
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);

    match command {
        Command::Seed { target } => {
            let sink = build_sink(config, dry_run)?;
            let source = seed_source(*target, config, clock)?;
            let writer = SinkWriter::new(sink, config.ingest.asset_batch_size)
                .with_pause(Duration::from_millis(config.ingest.batch_pause_ms))
                .with_policy(FallbackPolicy::PerRecord);
            Ok(SeedJob::new(command.label(), source, writer).run().await)
        }
        Command::Backfill { target, days } => {
            let sink = build_sink(config, dry_run)?;
            if dry_run {
                prime_dry_run(sink.clone(), *target).await;
            }
            let plan = BackfillPlan {
                categories: target.categories(),
                days: days.unwrap_or_else(|| target.default_days()),
                request_pause: Duration::from_millis(config.ingest.request_pause_ms),
            };
            let source = history_source(*target, config)?;
            let writer = SinkWriter::new(sink, config.ingest.history_batch_size)
                .with_pause(Duration::from_millis(config.ingest.batch_pause_ms));
            Ok(BackfillJob::new(command.label(), plan, source, writer, clock).run().await)
        }
    }
}

fn build_sink(config: &AppConfig, dry_run: bool) -> anyhow::Result<Arc<dyn UpsertSink>> {
    if dry_run {
        info!("Dry run: writing into the in-memory sink");
        return Ok(Arc::new(MemorySink::new()));
    }
    Ok(Arc::new(RestSink::new(&config.backend)?))
}

/// # Summary
/// 按种子目标装配资产数据源。
///
/// # Logic
/// - 加密货币：Binance (主站、镜像、跳过校验重试)，失败或为空时回退到内置交易对。
/// - 美股 / 美国 ETF：TradingView 扫描，失败或为空时回退到精选清单。
/// - 外汇与商品、REIT、共同基金：内置清单。
/// - 土耳其基金：TEFAS。
pub fn seed_source(
    target: SeedTarget,
    config: &AppConfig,
    clock: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn AssetSource>, SourceError> {
    let feeds = &config.feeds;
    let source: Arc<dyn AssetSource> = match target {
        SeedTarget::Crypto => Arc::new(FallbackSource::new(
            Arc::new(BinanceSource::new(feeds)?),
            Arc::new(CatalogSource::new(Catalog::BinancePairs)),
        )),
        SeedTarget::Forex => Arc::new(CatalogSource::new(Catalog::ForexAndCommodities)),
        SeedTarget::UsStocks => Arc::new(FallbackSource::new(
            Arc::new(TradingViewSource::new(feeds, ScanKind::Stocks)?),
            Arc::new(CatalogSource::new(Catalog::UsStocks)),
        )),
        SeedTarget::UsEtfs => Arc::new(FallbackSource::new(
            Arc::new(TradingViewSource::new(feeds, ScanKind::Etfs)?),
            Arc::new(CatalogSource::new(Catalog::UsEtfs)),
        )),
        SeedTarget::UsReits => Arc::new(CatalogSource::new(Catalog::UsReits)),
        SeedTarget::UsMutualFunds => Arc::new(CatalogSource::new(Catalog::UsMutualFunds)),
        SeedTarget::Funds => Arc::new(TefasSource::new(feeds, clock)?),
    };
    Ok(source)
}

pub fn history_source(
    target: BackfillTarget,
    config: &AppConfig,
) -> Result<Arc<dyn HistorySource>, SourceError> {
    let feeds = &config.feeds;
    let source: Arc<dyn HistorySource> = match target {
        BackfillTarget::UsStocks => Arc::new(YahooSource::new(feeds)?),
        BackfillTarget::Forex => Arc::new(FrankfurterSource::new(feeds)?),
        BackfillTarget::Crypto => Arc::new(BinanceSource::new(feeds)?),
    };
    Ok(source)
}

/// dry-run 回填时的资产清单取自内置清单。
pub fn dry_run_assets(target: BackfillTarget) -> Result<Vec<AssetRecord>, SourceError> {
    Ok(match target {
        BackfillTarget::UsStocks => {
            let mut assets = catalog::us_stocks();
            assets.extend(catalog::us_etfs());
            assets
        }
        BackfillTarget::Forex => catalog::forex_pairs(),
        BackfillTarget::Crypto => catalog::binance_pairs()?,
    })
}

async fn prime_dry_run(sink: Arc<dyn UpsertSink>, target: BackfillTarget) {
    let assets = match dry_run_assets(target) {
        Ok(assets) => assets,
        Err(e) => {
            warn!(error = %e, "Failed to load bundled assets for dry run");
            Vec::new()
        }
    };
    let report = SinkWriter::new(sink, assets.len().max(1)).write(&assets).await;
    info!(assets = %report, "Dry run: primed in-memory assets from the bundled catalog");
}

use clap::{Parser, Subcommand, ValueEnum};
use invsim_core::common::AssetCategory;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "invsim",
    version,
    about = "Seed asset catalogs and backfill daily price history into the hosted backend"
)]
pub struct Cli {
    /// Path to a TOML config file. Defaults to config/invsim.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write into an in-memory sink instead of the backend.
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Override both the asset and the price batch size.
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch an asset catalog and upsert it into `assets`.
    Seed {
        #[arg(value_enum)]
        target: SeedTarget,
    },
    /// Fetch daily history for stored assets and upsert it into `historical_prices`.
    Backfill {
        #[arg(value_enum)]
        target: BackfillTarget,

        /// Lookback window in days.
        days: Option<u32>,
    },
}

impl Command {
    /// 任务名，用于日志与汇总行。
    pub fn label(&self) -> String {
        match self {
            Command::Seed { target } => format!("seed {}", target.as_arg()),
            Command::Backfill { target, .. } => format!("backfill {}", target.as_arg()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeedTarget {
    Crypto,
    /// Forex pairs and commodities
    Forex,
    UsStocks,
    UsEtfs,
    UsReits,
    UsMutualFunds,
    /// Turkish investment funds (TEFAS)
    Funds,
}

impl SeedTarget {
    pub fn as_arg(self) -> &'static str {
        match self {
            SeedTarget::Crypto => "crypto",
            SeedTarget::Forex => "forex",
            SeedTarget::UsStocks => "us-stocks",
            SeedTarget::UsEtfs => "us-etfs",
            SeedTarget::UsReits => "us-reits",
            SeedTarget::UsMutualFunds => "us-mutual-funds",
            SeedTarget::Funds => "funds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackfillTarget {
    /// US stocks and ETFs from Yahoo Finance
    UsStocks,
    /// Forex cross rates from Frankfurter
    Forex,
    /// Binance daily klines
    Crypto,
}

impl BackfillTarget {
    pub fn as_arg(self) -> &'static str {
        match self {
            BackfillTarget::UsStocks => "us-stocks",
            BackfillTarget::Forex => "forex",
            BackfillTarget::Crypto => "crypto",
        }
    }

    pub fn default_days(self) -> u32 {
        match self {
            BackfillTarget::UsStocks => 730,
            BackfillTarget::Forex => 90,
            BackfillTarget::Crypto => 365,
        }
    }

    /// 回填时从 `assets` 表读取的分类。
    pub fn categories(self) -> Vec<AssetCategory> {
        match self {
            BackfillTarget::UsStocks => vec![AssetCategory::UsStock, AssetCategory::UsEtf],
            BackfillTarget::Forex => vec![AssetCategory::Forex],
            BackfillTarget::Crypto => vec![AssetCategory::Crypto],
        }
    }
}

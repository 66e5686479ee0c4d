use crate::binance::{SymbolInfo, usdt_pairs};
use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::AssetSource;

// 在线接口全部失败时使用的 Binance 交易对快照
const BINANCE_BUNDLED: &str = include_str!("../data/binance_fallback.json");

const FOREX_PAIRS: &[(&str, &str)] = &[
    ("EURUSD", "Euro / US Dollar"),
    ("GBPUSD", "British Pound / US Dollar"),
    ("USDJPY", "US Dollar / Japanese Yen"),
    ("USDCHF", "US Dollar / Swiss Franc"),
    ("AUDUSD", "Australian Dollar / US Dollar"),
    ("USDCAD", "US Dollar / Canadian Dollar"),
    ("NZDUSD", "New Zealand Dollar / US Dollar"),
    ("EURGBP", "Euro / British Pound"),
    ("EURJPY", "Euro / Japanese Yen"),
    ("GBPJPY", "British Pound / Japanese Yen"),
    ("AUDJPY", "Australian Dollar / Japanese Yen"),
    ("EURAUD", "Euro / Australian Dollar"),
    ("EURCHF", "Euro / Swiss Franc"),
    ("AUDNZD", "Australian Dollar / New Zealand Dollar"),
    ("USDTRY", "US Dollar / Turkish Lira"),
    ("EURTRY", "Euro / Turkish Lira"),
    ("GBPTRY", "British Pound / Turkish Lira"),
    ("TRYJPY", "Turkish Lira / Japanese Yen"),
    ("USDCNH", "US Dollar / Chinese Yuan"),
    ("USDZAR", "US Dollar / South African Rand"),
    ("USDMXN", "US Dollar / Mexican Peso"),
    ("USDBRL", "US Dollar / Brazilian Real"),
    ("USDRUB", "US Dollar / Russian Ruble"),
    ("USDINR", "US Dollar / Indian Rupee"),
    ("USDKRW", "US Dollar / South Korean Won"),
];

// (代码, 名称, 提供者交易代码, 数据源)
const COMMODITIES: &[(&str, &str, &str, &str)] = &[
    ("XAUUSD", "Gold / US Dollar", "XAU/USD", "goldapi"),
    ("XAGUSD", "Silver / US Dollar", "XAG/USD", "goldapi"),
    ("XPTUSD", "Platinum / US Dollar", "XPT/USD", "goldapi"),
    ("XPDUSD", "Palladium / US Dollar", "XPD/USD", "goldapi"),
    ("CL=F", "Crude Oil", "CL=F", "yahoo"),
    ("BZ=F", "Brent Crude Oil", "BZ=F", "yahoo"),
    ("NG=F", "Natural Gas", "NG=F", "yahoo"),
    ("HG=F", "Copper", "HG=F", "yahoo"),
];

// REIT 个股与 REIT ETF 统一归入 us_reit
const US_REITS: &[(&str, &str)] = &[
    ("VNQ", "Vanguard Real Estate ETF"),
    ("IYR", "iShares U.S. Real Estate ETF"),
    ("XLRE", "Real Estate Select Sector SPDR"),
    ("SCHH", "Schwab U.S. REIT ETF"),
    ("USRT", "iShares Core U.S. REIT ETF"),
    ("PLD", "Prologis Inc"),
    ("AMT", "American Tower Corp"),
    ("CCI", "Crown Castle Inc"),
    ("EQIX", "Equinix Inc"),
    ("PSA", "Public Storage"),
    ("WELL", "Welltower Inc"),
    ("DLR", "Digital Realty Trust"),
    ("O", "Realty Income Corp"),
    ("CBRE", "CBRE Group Inc"),
    ("SPG", "Simon Property Group"),
    ("AVB", "AvalonBay Communities"),
    ("EQR", "Equity Residential"),
    ("MAA", "Mid-America Apartment Communities"),
    ("UDR", "UDR Inc"),
    ("ESS", "Essex Property Trust"),
    ("PEAK", "Healthpeak Properties"),
    ("VTR", "Ventas Inc"),
    ("DOC", "Physicians Realty Trust"),
    ("HR", "Healthcare Realty Trust"),
    ("DRE", "Duke Realty Corp"),
    ("REXR", "Rexford Industrial Realty"),
    ("FR", "First Industrial Realty Trust"),
    ("REG", "Regency Centers Corp"),
    ("FRT", "Federal Realty Investment Trust"),
    ("KIM", "Kimco Realty Corp"),
    ("BXP", "Boston Properties"),
    ("VNO", "Vornado Realty Trust"),
    ("SLG", "SL Green Realty Corp"),
    ("CONE", "CyrusOne Inc"),
    ("QTS", "QTS Realty Trust"),
    ("EXR", "Extra Space Storage"),
    ("CUBE", "CubeSmart"),
    ("LSI", "Life Storage Inc"),
    ("HST", "Host Hotels & Resorts"),
    ("RHP", "Ryman Hospitality Properties"),
    ("INVH", "Invitation Homes Inc"),
    ("AMH", "American Homes 4 Rent"),
    ("STAG", "STAG Industrial Inc"),
    ("COLD", "Americold Realty Trust"),
    ("SBAC", "SBA Communications Corp"),
];

const US_MUTUAL_FUNDS: &[(&str, &str)] = &[
    ("VFIAX", "Vanguard 500 Index Admiral"),
    ("VTSAX", "Vanguard Total Stock Market Index Admiral"),
    ("VGTSX", "Vanguard Total International Stock Index"),
    ("VTIAX", "Vanguard Total International Stock Index Admiral"),
    ("VBTLX", "Vanguard Total Bond Market Index Admiral"),
    ("VBMFX", "Vanguard Total Bond Market Index"),
    ("VWELX", "Vanguard Wellington Fund"),
    ("VWINX", "Vanguard Wellesley Income Fund"),
    ("VWIUX", "Vanguard Wellesley Income Admiral"),
    ("VGSLX", "Vanguard Real Estate Index Admiral"),
    ("VEXAX", "Vanguard Extended Market Index Admiral"),
    ("VSIAX", "Vanguard Small-Cap Index Admiral"),
    ("VMCAX", "Vanguard Mid-Cap Index Admiral"),
    ("VIGAX", "Vanguard Growth Index Admiral"),
    ("VVIAX", "Vanguard Value Index Admiral"),
    ("FXAIX", "Fidelity 500 Index"),
    ("FSKAX", "Fidelity Total Market Index"),
    ("FTIHX", "Fidelity Total International Index"),
    ("FXNAX", "Fidelity U.S. Bond Index"),
    ("FSMAX", "Fidelity Extended Market Index"),
    ("FSMDX", "Fidelity Mid Cap Index"),
    ("FSSNX", "Fidelity Small Cap Index"),
    ("FZROX", "Fidelity ZERO Total Market Index"),
    ("FZILX", "Fidelity ZERO International Index"),
    ("SWPPX", "Schwab S&P 500 Index"),
    ("SWTSX", "Schwab Total Stock Market Index"),
    ("SWISX", "Schwab International Index"),
    ("SWAGX", "Schwab U.S. Aggregate Bond Index"),
    ("SWSSX", "Schwab Small-Cap Index"),
    ("VTTVX", "Vanguard Target Retirement 2025"),
    ("VTTHX", "Vanguard Target Retirement 2030"),
    ("VTHRX", "Vanguard Target Retirement 2035"),
    ("VFORX", "Vanguard Target Retirement 2040"),
    ("VTIVX", "Vanguard Target Retirement 2045"),
    ("VFIFX", "Vanguard Target Retirement 2050"),
    ("VTTSX", "Vanguard Target Retirement 2060"),
];

const US_ETFS: &[(&str, &str)] = &[
    ("SPY", "SPDR S&P 500 ETF Trust"),
    ("IVV", "iShares Core S&P 500 ETF"),
    ("VOO", "Vanguard S&P 500 ETF"),
    ("QQQ", "Invesco QQQ Trust"),
    ("VTI", "Vanguard Total Stock Market ETF"),
    ("DIA", "SPDR Dow Jones Industrial Average ETF"),
    ("IWM", "iShares Russell 2000 ETF"),
    ("VEA", "Vanguard FTSE Developed Markets ETF"),
    ("IEFA", "iShares Core MSCI EAFE ETF"),
    ("VWO", "Vanguard FTSE Emerging Markets ETF"),
    ("VXUS", "Vanguard Total International Stock ETF"),
    ("IEMG", "iShares Core MSCI Emerging Markets ETF"),
    ("AGG", "iShares Core U.S. Aggregate Bond ETF"),
    ("BND", "Vanguard Total Bond Market ETF"),
    ("TLT", "iShares 20+ Year Treasury Bond ETF"),
    ("LQD", "iShares iBoxx $ Inv Grade Corporate Bond ETF"),
    ("XLK", "Technology Select Sector SPDR Fund"),
    ("XLF", "Financial Select Sector SPDR Fund"),
    ("XLV", "Health Care Select Sector SPDR Fund"),
    ("XLE", "Energy Select Sector SPDR Fund"),
    ("VNQ", "Vanguard Real Estate ETF"),
    ("GLD", "SPDR Gold Shares"),
    ("SLV", "iShares Silver Trust"),
    ("VUG", "Vanguard Growth ETF"),
    ("VTV", "Vanguard Value ETF"),
    ("VIG", "Vanguard Dividend Appreciation ETF"),
    ("TQQQ", "ProShares UltraPro QQQ"),
    ("SQQQ", "ProShares UltraPro Short QQQ"),
    ("ARKK", "ARK Innovation ETF"),
    ("SOXX", "iShares Semiconductor ETF"),
];

const US_STOCKS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc. Class A"),
    ("GOOG", "Alphabet Inc. Class C"),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc."),
    ("TSLA", "Tesla Inc."),
    ("AVGO", "Broadcom Inc."),
    ("ORCL", "Oracle Corporation"),
    ("ADBE", "Adobe Inc."),
    ("CRM", "Salesforce Inc."),
    ("CSCO", "Cisco Systems Inc."),
    ("INTC", "Intel Corporation"),
    ("AMD", "Advanced Micro Devices Inc."),
    ("QCOM", "QUALCOMM Inc."),
    ("TXN", "Texas Instruments Inc."),
    ("NFLX", "Netflix Inc."),
    ("UBER", "Uber Technologies Inc."),
    ("ABNB", "Airbnb Inc."),
    ("SNOW", "Snowflake Inc."),
    ("PLTR", "Palantir Technologies Inc."),
    ("BRK.B", "Berkshire Hathaway Inc. Class B"),
    ("JPM", "JPMorgan Chase & Co."),
    ("V", "Visa Inc."),
    ("MA", "Mastercard Inc."),
    ("BAC", "Bank of America Corp."),
    ("WFC", "Wells Fargo & Co."),
    ("GS", "Goldman Sachs Group Inc."),
    ("MS", "Morgan Stanley"),
    ("AXP", "American Express Co."),
    ("BLK", "BlackRock Inc."),
    ("UNH", "UnitedHealth Group Inc."),
    ("JNJ", "Johnson & Johnson"),
    ("LLY", "Eli Lilly and Co."),
    ("ABBV", "AbbVie Inc."),
    ("MRK", "Merck & Co. Inc."),
    ("PFE", "Pfizer Inc."),
    ("TMO", "Thermo Fisher Scientific Inc."),
    ("ABT", "Abbott Laboratories"),
    ("DHR", "Danaher Corporation"),
    ("WMT", "Walmart Inc."),
    ("HD", "Home Depot Inc."),
    ("COST", "Costco Wholesale Corp."),
    ("PG", "Procter & Gamble Co."),
    ("KO", "Coca-Cola Co."),
    ("PEP", "PepsiCo Inc."),
    ("MCD", "McDonald's Corp."),
    ("NKE", "Nike Inc."),
    ("SBUX", "Starbucks Corp."),
    ("TGT", "Target Corp."),
    ("XOM", "Exxon Mobil Corp."),
    ("CVX", "Chevron Corp."),
    ("BA", "Boeing Co."),
    ("CAT", "Caterpillar Inc."),
    ("GE", "General Electric Co."),
    ("RTX", "RTX Corporation"),
    ("LMT", "Lockheed Martin Corp."),
    ("T", "AT&T Inc."),
    ("VZ", "Verizon Communications Inc."),
    ("CMCSA", "Comcast Corp."),
    ("DIS", "Walt Disney Co."),
    ("ASML", "ASML Holding NV"),
    ("TSM", "Taiwan Semiconductor Manufacturing"),
    ("AMAT", "Applied Materials Inc."),
    ("LRCX", "Lam Research Corp."),
    ("KLAC", "KLA Corporation"),
    ("MU", "Micron Technology Inc."),
    ("BABA", "Alibaba Group Holding Ltd."),
    ("SHOP", "Shopify Inc."),
    ("MELI", "MercadoLibre Inc."),
    ("F", "Ford Motor Co."),
    ("GM", "General Motors Co."),
    ("RIVN", "Rivian Automotive Inc."),
    ("GILD", "Gilead Sciences Inc."),
    ("AMGN", "Amgen Inc."),
    ("VRTX", "Vertex Pharmaceuticals Inc."),
    ("REGN", "Regeneron Pharmaceuticals Inc."),
    ("PYPL", "PayPal Holdings Inc."),
    ("SQ", "Block Inc."),
    ("COIN", "Coinbase Global Inc."),
    ("NOW", "ServiceNow Inc."),
    ("PANW", "Palo Alto Networks Inc."),
    ("CRWD", "CrowdStrike Holdings Inc."),
    ("ZS", "Zscaler Inc."),
    ("SPOT", "Spotify Technology SA"),
    ("RBLX", "Roblox Corp."),
    ("EA", "Electronic Arts Inc."),
    ("IBM", "International Business Machines"),
    ("SPGI", "S&P Global Inc."),
    ("ISRG", "Intuitive Surgical Inc."),
    ("INTU", "Intuit Inc."),
    ("ADSK", "Autodesk Inc."),
    ("MRNA", "Moderna Inc."),
];

/// 外汇货币对，价格与实时推送均来自 tiingo。
pub fn forex_pairs() -> Vec<AssetRecord> {
    FOREX_PAIRS
        .iter()
        .map(|(code, name)| {
            AssetRecord::new(*code, *name, AssetCategory::Forex, "tiingo").streaming("tiingo")
        })
        .collect()
}

/// 贵金属 (GoldAPI) 与能源/工业金属期货 (Yahoo)。
pub fn commodities() -> Vec<AssetRecord> {
    COMMODITIES
        .iter()
        .map(|(code, name, symbol, provider)| {
            AssetRecord::new(*code, *name, AssetCategory::Commodity, *provider)
                .with_symbol(*symbol)
                .streaming(*provider)
        })
        .collect()
}

fn alpaca_list(list: &[(&str, &str)], category: AssetCategory) -> Vec<AssetRecord> {
    list.iter()
        .map(|(code, name)| AssetRecord::new(*code, *name, category, "alpaca").streaming("alpaca"))
        .collect()
}

pub fn us_reits() -> Vec<AssetRecord> {
    alpaca_list(US_REITS, AssetCategory::UsReit)
}

/// 共同基金只有日终净值，不支持实时推送。
pub fn us_mutual_funds() -> Vec<AssetRecord> {
    US_MUTUAL_FUNDS
        .iter()
        .map(|(code, name)| AssetRecord::new(*code, *name, AssetCategory::UsMutualFund, "yahoo"))
        .collect()
}

pub fn us_etfs() -> Vec<AssetRecord> {
    alpaca_list(US_ETFS, AssetCategory::UsEtf)
}

pub fn us_stocks() -> Vec<AssetRecord> {
    alpaca_list(US_STOCKS, AssetCategory::UsStock)
}

/// # Summary
/// 解析随二进制打包的 Binance 交易对快照。
///
/// # Returns
/// 返回正在交易的 USDT 交易对，快照损坏时返回 `SourceError::Parse`。
pub fn binance_pairs() -> Result<Vec<AssetRecord>, SourceError> {
    let symbols: Vec<SymbolInfo> =
        serde_json::from_str(BINANCE_BUNDLED).map_err(|e| SourceError::Parse(e.to_string()))?;
    Ok(usdt_pairs(&symbols))
}

/// 内置清单的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    /// 外汇货币对 + 大宗商品
    ForexAndCommodities,
    UsReits,
    UsMutualFunds,
    UsEtfs,
    UsStocks,
    BinancePairs,
}

impl Catalog {
    pub fn assets(self) -> Result<Vec<AssetRecord>, SourceError> {
        Ok(match self {
            Catalog::ForexAndCommodities => {
                let mut assets = forex_pairs();
                assets.extend(commodities());
                assets
            }
            Catalog::UsReits => us_reits(),
            Catalog::UsMutualFunds => us_mutual_funds(),
            Catalog::UsEtfs => us_etfs(),
            Catalog::UsStocks => us_stocks(),
            Catalog::BinancePairs => binance_pairs()?,
        })
    }
}

/// # Summary
/// 以内置清单作为资产数据源，不发起任何网络请求。
pub struct CatalogSource {
    catalog: Catalog,
}

impl CatalogSource {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl AssetSource for CatalogSource {
    fn name(&self) -> &str {
        match self.catalog {
            Catalog::ForexAndCommodities => "catalog:forex+commodities",
            Catalog::UsReits => "catalog:us_reits",
            Catalog::UsMutualFunds => "catalog:us_mutual_funds",
            Catalog::UsEtfs => "catalog:us_etfs",
            Catalog::UsStocks => "catalog:us_stocks",
            Catalog::BinancePairs => "catalog:binance",
        }
    }

    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError> {
        self.catalog.assets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_unique(assets: &[AssetRecord]) {
        let codes: HashSet<&str> = assets.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes.len(), assets.len(), "duplicate codes in catalog");
    }

    #[test]
    fn test_forex_and_commodities() {
        let assets = Catalog::ForexAndCommodities.assets().unwrap();
        assert_eq!(assets.len(), 33);
        assert_unique(&assets);

        let gold = assets.iter().find(|a| a.code == "XAUUSD").unwrap();
        assert_eq!(gold.symbol, "XAU/USD");
        assert_eq!(gold.provider, "goldapi");
        assert_eq!(gold.category, AssetCategory::Commodity);

        let usdtry = assets.iter().find(|a| a.code == "USDTRY").unwrap();
        assert_eq!(usdtry.provider, "tiingo");
        assert!(usdtry.is_websocket);
    }

    #[test]
    fn test_curated_lists_are_unique() {
        for catalog in [
            Catalog::UsReits,
            Catalog::UsMutualFunds,
            Catalog::UsEtfs,
            Catalog::UsStocks,
        ] {
            let assets = catalog.assets().unwrap();
            assert!(!assets.is_empty());
            assert_unique(&assets);
        }
    }

    #[test]
    fn test_mutual_funds_are_end_of_day_only() {
        let funds = us_mutual_funds();
        assert_eq!(funds.len(), 36);
        assert!(funds.iter().all(|f| !f.is_websocket && f.websocket_provider.is_none()));
        assert!(funds.iter().all(|f| f.provider == "yahoo"));
    }

    #[test]
    fn test_bundled_binance_pairs_parse() {
        let pairs = binance_pairs().unwrap();
        assert!(pairs.len() >= 30);
        assert!(pairs.iter().any(|p| p.code == "BTCUSDT" && p.name == "BTC/USDT"));
        assert_unique(&pairs);
    }
}

pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 资产分类枚举，对应后端 `assets.category` 列的取值。
///
/// # Invariants
/// - 序列化形式固定为 snake_case (例如 `us_stock`)，与后端表结构保持一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    // 加密货币交易对
    Crypto,
    // 外汇货币对
    Forex,
    // 大宗商品 (贵金属、能源)
    Commodity,
    // 美股个股
    UsStock,
    // 美股 ETF
    UsEtf,
    // 美股房地产信托
    UsReit,
    // 美国共同基金
    UsMutualFund,
    // 土耳其投资基金 (TEFAS)
    Fund,
}

impl AssetCategory {
    /// 全部分类，按后端约定的顺序排列。
    pub const ALL: [AssetCategory; 8] = [
        AssetCategory::Crypto,
        AssetCategory::Forex,
        AssetCategory::Commodity,
        AssetCategory::UsStock,
        AssetCategory::UsEtf,
        AssetCategory::UsReit,
        AssetCategory::UsMutualFund,
        AssetCategory::Fund,
    ];

    /// 返回后端存储使用的分类标签。
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Crypto => "crypto",
            AssetCategory::Forex => "forex",
            AssetCategory::Commodity => "commodity",
            AssetCategory::UsStock => "us_stock",
            AssetCategory::UsEtf => "us_etf",
            AssetCategory::UsReit => "us_reit",
            AssetCategory::UsMutualFund => "us_mutual_fund",
            AssetCategory::Fund => "fund",
        }
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AssetCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown AssetCategory: {}", s))
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_label() {
        for category in AssetCategory::ALL {
            let parsed: AssetCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_accepts_cli_spelling() {
        assert_eq!(
            "us-mutual-fund".parse::<AssetCategory>().unwrap(),
            AssetCategory::UsMutualFund
        );
        assert!("bond".parse::<AssetCategory>().is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&AssetCategory::UsEtf).unwrap();
        assert_eq!(json, "\"us_etf\"");
    }
}

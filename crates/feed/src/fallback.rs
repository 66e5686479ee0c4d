use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::AssetSource;
use std::sync::Arc;
use tracing::warn;

/// # Summary
/// 带备用清单的资产数据源组合器。
///
/// # Invariants
/// - 主数据源报错或返回空列表时，改用备用数据源的结果。
/// - 备用数据源的错误原样返回。
pub struct FallbackSource {
    name: String,
    primary: Arc<dyn AssetSource>,
    fallback: Arc<dyn AssetSource>,
}

impl FallbackSource {
    pub fn new(primary: Arc<dyn AssetSource>, fallback: Arc<dyn AssetSource>) -> Self {
        Self {
            name: format!("{}|{}", primary.name(), fallback.name()),
            primary,
            fallback,
        }
    }
}

#[async_trait]
impl AssetSource for FallbackSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError> {
        match self.primary.fetch_assets().await {
            Ok(assets) if !assets.is_empty() => return Ok(assets),
            Ok(_) => warn!(
                primary = self.primary.name(),
                fallback = self.fallback.name(),
                "Primary source returned no assets, using fallback"
            ),
            Err(e) => warn!(
                primary = self.primary.name(),
                fallback = self.fallback.name(),
                error = %e,
                "Primary source failed, using fallback"
            ),
        }
        self.fallback.fetch_assets().await
    }
}

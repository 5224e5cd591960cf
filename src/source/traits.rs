use crate::model::{MarketSeries, SourceError};

#[async_trait::async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<MarketSeries, SourceError>;
}

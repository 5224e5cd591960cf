use crate::model::{MarketSeries, SourceError};
use crate::parser::{JsonSeriesParser, SeriesParser};
use crate::source::traits::SeriesSource;
use tracing::debug;

/// Reads a JSON series document from disk.
pub struct FileSource {
    path: String,
    parser: JsonSeriesParser,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parser: JsonSeriesParser::new(),
        }
    }
}

#[async_trait::async_trait]
impl SeriesSource for FileSource {
    async fn fetch(&self, symbol: &str) -> Result<MarketSeries, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let series = self.parser.parse(&text)?;
        debug!(symbol, path = %self.path, samples = series.prices.len(), "Loaded series file");
        Ok(series)
    }
}

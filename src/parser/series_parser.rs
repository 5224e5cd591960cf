// JSON series documents: column form or candle list
use crate::model::{MarketSeries, ParserError};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub trait SeriesParser {
    fn parse(&self, text: &str) -> Result<MarketSeries, ParserError>;
}

#[derive(Debug, Deserialize)]
struct Candle {
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "close")]
    price: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeriesDocument {
    Columns { prices: Vec<f64>, volumes: Vec<f64> },
    Candles(Vec<Candle>),
}

/// Accepts `{"prices": [...], "volumes": [...]}` or
/// `[{"timestamp": ..., "price"|"close": ..., "volume": ...}, ...]`.
pub struct JsonSeriesParser;

impl JsonSeriesParser {
    pub fn new() -> Self {
        Self
    }
}

impl SeriesParser for JsonSeriesParser {
    fn parse(&self, text: &str) -> Result<MarketSeries, ParserError> {
        let series = match serde_json::from_str::<SeriesDocument>(text)? {
            SeriesDocument::Columns { prices, volumes } => MarketSeries { prices, volumes },
            SeriesDocument::Candles(mut candles) => {
                // Only reorder when every candle carries its time.
                if candles.iter().all(|c| c.timestamp.is_some()) {
                    candles.sort_by_key(|c| c.timestamp);
                }
                MarketSeries {
                    prices: candles.iter().map(|c| c.price).collect(),
                    volumes: candles.iter().map(|c| c.volume).collect(),
                }
            }
        };

        if series.prices.is_empty() && series.volumes.is_empty() {
            return Err(ParserError::Empty);
        }
        Ok(series)
    }
}

// Core structs: MarketSeries, MarketAnalysis and its parts
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chronological price/volume history for one symbol, oldest sample first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketSeries {
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndicator {
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicator {
    pub name: String,
    pub value: f64,
    pub signal: Signal,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Support,
    Resistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub level: f64,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub strength: LevelStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentFactor {
    pub name: String,
    pub impact: Impact,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub overall: Outlook,
    pub confidence: f64,
    pub factors: Vec<SentimentFactor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Buy,
    Sell,
    Hold,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Buy => "buy",
            RecommendedAction::Sell => "sell",
            RecommendedAction::Hold => "hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(RecommendedAction::Buy),
            "sell" => Some(RecommendedAction::Sell),
            "hold" => Some(RecommendedAction::Hold),
            _ => None,
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// The analysis report. Field names and enum strings are part of the
/// serialized contract and must stay as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: MarketIndicator,
    pub volume: MarketIndicator,
    pub technical_indicators: Vec<TechnicalIndicator>,
    pub support_resistance: Vec<SupportResistance>,
    pub sentiment: MarketSentiment,
    pub risk_level: RiskLevel,
    pub recommended_action: RecommendedAction,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{series} series has {len} samples, need at least 2")]
    TooShort { series: &'static str, len: usize },
    #[error("{series} series has a non-finite value at index {index}")]
    NonFinite { series: &'static str, index: usize },
    #[error("{series} series has an out-of-range value {value} at index {index}")]
    OutOfRange { series: &'static str, index: usize, value: f64 },
    #[error("previous {series} sample is zero, percent change is undefined")]
    ZeroPrevious { series: &'static str },
}

#[derive(Debug, Error)]
pub enum AnalysisFault {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("computation panicked: {0}")]
    Panicked(String),
    #[error("computed {0} is not a finite number")]
    NonFiniteResult(&'static str),
}

impl AnalysisFault {
    /// Panics were already logged by the panic hook when they were raised.
    pub fn already_reported(&self) -> bool {
        matches!(self, AnalysisFault::Panicked(_))
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to analyze market data")]
    Failed {
        symbol: String,
        #[source]
        source: AnalysisFault,
    },
}

impl AnalysisError {
    pub fn fault(&self) -> &AnalysisFault {
        match self {
            AnalysisError::Failed { source, .. } => source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed series document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("series document has no samples")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read series file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error("source produced no data for {0}")]
    NoData(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("report encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

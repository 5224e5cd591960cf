use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use thiserror::Error;

/// Indicator window lengths used by the analyzer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub rsi_period: usize,
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub volatility_period: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_short_period: 20,
            sma_long_period: 50,
            volatility_period: 20,
        }
    }
}

/// Where a market's history comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    File {
        path: String,
    },
    Demo {
        points: usize,
        start_price: f64,
        #[serde(default = "default_step_volatility")]
        step_volatility: f64,
        #[serde(default = "default_base_volume")]
        base_volume: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
}

fn default_step_volatility() -> f64 {
    0.02
}

fn default_base_volume() -> f64 {
    10_000.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub symbol: String,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    /// Re-run every N seconds; run once when absent.
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    pub markets: Vec<MarketConfig>,
}

fn default_history_limit() -> usize {
    100
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markets.is_empty() {
            return Err(ConfigError::Invalid("no markets configured".into()));
        }

        let mut seen = HashSet::new();
        for market in &self.markets {
            if market.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("market symbol is empty".into()));
            }
            if !seen.insert(market.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate market {}", market.symbol)));
            }
            if let SourceConfig::Demo { points, start_price, .. } = market.source {
                if points < 2 {
                    return Err(ConfigError::Invalid(format!(
                        "demo source for {} needs at least 2 points",
                        market.symbol
                    )));
                }
                if !(start_price > 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "demo source for {} needs a positive start price",
                        market.symbol
                    )));
                }
            }
        }

        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be positive".into()));
        }

        let a = &self.analysis;
        let periods = [
            ("rsi_period", a.rsi_period),
            ("sma_short_period", a.sma_short_period),
            ("sma_long_period", a.sma_long_period),
            ("volatility_period", a.volatility_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(ConfigError::Invalid(format!("{} must be positive", name)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(
            r#"{
                "database_path": ":memory:",
                "markets": [{ "symbol": "BTC/USD", "source": { "kind": "file", "path": "btc.json" } }]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis, AnalysisSettings::default());
        assert_eq!(cfg.history_limit, 100);
        assert!(cfg.check_interval_seconds.is_none());
        assert_eq!(
            cfg.markets[0].source,
            SourceConfig::File { path: "btc.json".into() }
        );
    }

    #[test]
    fn demo_source_defaults() {
        let cfg = parse_config(
            r#"{
                "database_path": ":memory:",
                "analysis": { "rsi_period": 7 },
                "markets": [{ "symbol": "ETH/USD", "source": { "kind": "demo", "points": 60, "start_price": 3000.0 } }]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.rsi_period, 7);
        assert_eq!(cfg.analysis.sma_long_period, 50);
        match &cfg.markets[0].source {
            SourceConfig::Demo { step_volatility, base_volume, seed, .. } => {
                assert_eq!(*step_volatility, 0.02);
                assert_eq!(*base_volume, 10_000.0);
                assert!(seed.is_none());
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let err = parse_config(
            r#"{
                "database_path": ":memory:",
                "markets": [
                    { "symbol": "BTC/USD", "source": { "kind": "file", "path": "a.json" } },
                    { "symbol": "BTC/USD", "source": { "kind": "file", "path": "b.json" } }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_period_and_empty_markets() {
        let err = parse_config(
            r#"{
                "database_path": ":memory:",
                "analysis": { "volatility_period": 0 },
                "markets": [{ "symbol": "BTC/USD", "source": { "kind": "file", "path": "a.json" } }]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid config: volatility_period must be positive");

        let err = parse_config(r#"{ "database_path": ":memory:", "markets": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_history_limit() {
        let err = parse_config(
            r#"{
                "database_path": ":memory:",
                "history_limit": 0,
                "markets": [{ "symbol": "BTC/USD", "source": { "kind": "file", "path": "a.json" } }]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid config: history_limit must be positive");
    }
}

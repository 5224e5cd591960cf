use crate::analyzer::assessment::{assess_risk, count_signals, sentiment};
use crate::analyzer::indicators::{moving_average, rsi, volatility};
use crate::analyzer::levels::support_resistance;
use crate::config::AnalysisSettings;
use crate::model::{
    AnalysisError, AnalysisFault, InputError, MarketAnalysis, MarketIndicator, MarketSentiment,
    Outlook, RecommendedAction, Signal, TechnicalIndicator,
};
use crate::utils::percent_change;
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;
const VOLUME_SIGNAL_PERCENT: f64 = 20.0;
const UNUSUAL_VOLUME_PERCENT: f64 = 50.0;
const HIGH_VOLATILITY: f64 = 0.03;

const RSI_CONFIDENCE: f64 = 0.8;
const SMA_CROSS_CONFIDENCE: f64 = 0.75;
const VOLUME_CONFIDENCE: f64 = 0.6;
const DECISIVE_CONFIDENCE: f64 = 0.8;
const HOLD_CONFIDENCE: f64 = 0.6;

pub const OVERBOUGHT_WARNING: &str = "Overbought conditions detected";
pub const OVERSOLD_WARNING: &str = "Oversold conditions detected";
pub const UNUSUAL_VOLUME_WARNING: &str = "Unusual volume activity detected";
pub const HIGH_VOLATILITY_WARNING: &str = "High volatility detected";

/// Trait defining the interface for a market analyzer.
pub trait Analyzer {
    /// Turns a price/volume history into an analysis report.
    ///
    /// Both series are chronological, oldest first, and need at least two
    /// finite samples with a non-zero previous value. Prices must be positive
    /// and volumes non-negative. Violations, and any
    /// other fault during the computation, come back as
    /// [`AnalysisError::Failed`] with the cause attached. No partial report
    /// is ever returned.
    fn analyze_market(
        &self,
        symbol: &str,
        prices: &[f64],
        volumes: &[f64],
    ) -> Result<MarketAnalysis, AnalysisError>;
}

/// Stateless implementation of the market analyzer. Holds only the indicator
/// window lengths.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerImpl {
    settings: AnalysisSettings,
}

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Builds the report. Inputs must already satisfy the preconditions.
    fn assemble(&self, symbol: &str, prices: &[f64], volumes: &[f64]) -> MarketAnalysis {
        let s = &self.settings;

        let price = snapshot(prices);
        let volume = snapshot(volumes);

        let sma_short = moving_average(prices, s.sma_short_period);
        let sma_long = moving_average(prices, s.sma_long_period);
        let rsi_value = rsi(prices, s.rsi_period);
        let volatility_value = volatility(prices, s.volatility_period);
        debug!(
            symbol,
            sma_short, sma_long, rsi = rsi_value, volatility = volatility_value,
            "Indicators computed"
        );

        let technical_indicators = vec![
            rsi_indicator(rsi_value),
            sma_cross_indicator(sma_short, sma_long),
            volume_indicator(volume.change_percent),
        ];

        let risk_level = assess_risk(volatility_value, rsi_value, volume.change_percent);
        let levels = support_resistance(prices, price.value);
        let market_sentiment = sentiment(&technical_indicators, volume.change_percent, price.change);
        let warnings = collect_warnings(rsi_value, volume.change_percent, volatility_value);
        let (recommended_action, confidence) =
            recommend_action(&technical_indicators, &market_sentiment);

        MarketAnalysis {
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            price,
            volume,
            technical_indicators,
            support_resistance: levels,
            sentiment: market_sentiment,
            risk_level,
            recommended_action,
            confidence,
            warnings,
        }
    }
}

impl Analyzer for AnalyzerImpl {
    fn analyze_market(
        &self,
        symbol: &str,
        prices: &[f64],
        volumes: &[f64],
    ) -> Result<MarketAnalysis, AnalysisError> {
        let outcome = check_preconditions(prices, volumes)
            .map_err(AnalysisFault::from)
            .and_then(|()| {
                panic::catch_unwind(AssertUnwindSafe(|| self.assemble(symbol, prices, volumes)))
                    .map_err(|payload| AnalysisFault::Panicked(panic_message(payload.as_ref())))
            })
            .and_then(|report| match first_non_finite(&report) {
                Some(field) => Err(AnalysisFault::NonFiniteResult(field)),
                None => Ok(report),
            });

        outcome.map_err(|fault| {
            if fault.already_reported() {
                debug!(symbol, cause = %fault, "Market analysis failed");
            } else {
                error!(symbol, cause = %fault, "Market analysis failed");
            }
            AnalysisError::Failed {
                symbol: symbol.to_string(),
                source: fault,
            }
        })
    }
}

fn check_preconditions(prices: &[f64], volumes: &[f64]) -> Result<(), InputError> {
    // Prices must be positive, volumes non-negative.
    let checks: [(&'static str, &[f64], fn(f64) -> bool); 2] = [
        ("price", prices, |v| v > 0.0),
        ("volume", volumes, |v| v >= 0.0),
    ];
    for (series, values, in_range) in checks {
        if values.len() < 2 {
            return Err(InputError::TooShort { series, len: values.len() });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFinite { series, index });
        }
        if let Some(index) = values.iter().position(|v| !in_range(*v)) {
            return Err(InputError::OutOfRange { series, index, value: values[index] });
        }
        if values[values.len() - 2] == 0.0 {
            return Err(InputError::ZeroPrevious { series });
        }
    }
    Ok(())
}

fn snapshot(values: &[f64]) -> MarketIndicator {
    let current = values[values.len() - 1];
    let previous = values[values.len() - 2];
    MarketIndicator {
        value: current,
        change: current - previous,
        change_percent: percent_change(previous, current),
    }
}

fn rsi_indicator(value: f64) -> TechnicalIndicator {
    let signal = if value > RSI_OVERBOUGHT {
        Signal::Sell
    } else if value < RSI_OVERSOLD {
        Signal::Buy
    } else {
        Signal::Neutral
    };
    TechnicalIndicator {
        name: "RSI".to_string(),
        value,
        signal,
        confidence: RSI_CONFIDENCE,
    }
}

fn sma_cross_indicator(sma_short: f64, sma_long: f64) -> TechnicalIndicator {
    let signal = if sma_short > sma_long {
        Signal::Buy
    } else if sma_short < sma_long {
        Signal::Sell
    } else {
        Signal::Neutral
    };
    TechnicalIndicator {
        name: "SMA Cross".to_string(),
        value: sma_short - sma_long,
        signal,
        confidence: SMA_CROSS_CONFIDENCE,
    }
}

fn volume_indicator(change_percent: f64) -> TechnicalIndicator {
    let signal = if change_percent > VOLUME_SIGNAL_PERCENT {
        Signal::Buy
    } else if change_percent < -VOLUME_SIGNAL_PERCENT {
        Signal::Sell
    } else {
        Signal::Neutral
    };
    TechnicalIndicator {
        name: "Volume".to_string(),
        value: change_percent,
        signal,
        confidence: VOLUME_CONFIDENCE,
    }
}

/// Warnings in fixed order: overbought, oversold, unusual volume, high volatility.
pub fn collect_warnings(rsi: f64, volume_change_percent: f64, volatility: f64) -> Vec<String> {
    let checks = [
        (rsi > RSI_OVERBOUGHT, OVERBOUGHT_WARNING),
        (rsi < RSI_OVERSOLD, OVERSOLD_WARNING),
        (volume_change_percent.abs() > UNUSUAL_VOLUME_PERCENT, UNUSUAL_VOLUME_WARNING),
        (volatility > HIGH_VOLATILITY, HIGH_VOLATILITY_WARNING),
    ];
    checks
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Buy or sell only when the indicator majority and the sentiment agree;
/// anything else is a hold.
pub fn recommend_action(
    indicators: &[TechnicalIndicator],
    sentiment: &MarketSentiment,
) -> (RecommendedAction, f64) {
    let (buys, sells) = count_signals(indicators);
    if buys > sells && sentiment.overall == Outlook::Bullish {
        (RecommendedAction::Buy, DECISIVE_CONFIDENCE)
    } else if sells > buys && sentiment.overall == Outlook::Bearish {
        (RecommendedAction::Sell, DECISIVE_CONFIDENCE)
    } else {
        (RecommendedAction::Hold, HOLD_CONFIDENCE)
    }
}

fn first_non_finite(report: &MarketAnalysis) -> Option<&'static str> {
    let scalars = [
        ("price", report.price.value),
        ("price change", report.price.change),
        ("price change percent", report.price.change_percent),
        ("volume", report.volume.value),
        ("volume change", report.volume.change),
        ("volume change percent", report.volume.change_percent),
    ];
    if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
        return Some(*name);
    }
    if report.technical_indicators.iter().any(|i| !i.value.is_finite()) {
        return Some("technical indicator");
    }
    if report.support_resistance.iter().any(|l| !l.level.is_finite()) {
        return Some("support/resistance level");
    }
    None
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Impact, RiskLevel, SentimentFactor};

    fn indicator(signal: Signal) -> TechnicalIndicator {
        TechnicalIndicator {
            name: "test".into(),
            value: 0.0,
            signal,
            confidence: 0.5,
        }
    }

    fn forced_sentiment(overall: Outlook) -> MarketSentiment {
        MarketSentiment {
            overall,
            confidence: 0.7,
            factors: vec![SentimentFactor {
                name: "Price Action".into(),
                impact: Impact::Negative,
                weight: 0.3,
            }],
        }
    }

    #[test]
    fn buy_majority_with_bearish_sentiment_holds() {
        let indicators = [indicator(Signal::Buy), indicator(Signal::Buy), indicator(Signal::Sell)];
        let (action, confidence) = recommend_action(&indicators, &forced_sentiment(Outlook::Bearish));
        assert_eq!(action, RecommendedAction::Hold);
        assert_eq!(confidence, 0.6);
    }

    #[test]
    fn agreement_is_decisive() {
        let buys = [indicator(Signal::Buy), indicator(Signal::Buy), indicator(Signal::Sell)];
        assert_eq!(
            recommend_action(&buys, &forced_sentiment(Outlook::Bullish)),
            (RecommendedAction::Buy, 0.8)
        );

        let sells = [indicator(Signal::Sell), indicator(Signal::Neutral)];
        assert_eq!(
            recommend_action(&sells, &forced_sentiment(Outlook::Bearish)),
            (RecommendedAction::Sell, 0.8)
        );
    }

    #[test]
    fn neutral_sentiment_always_holds() {
        let sells = [indicator(Signal::Sell), indicator(Signal::Sell)];
        assert_eq!(
            recommend_action(&sells, &forced_sentiment(Outlook::Neutral)),
            (RecommendedAction::Hold, 0.6)
        );
    }

    #[test]
    fn warnings_keep_fixed_order() {
        let warnings = collect_warnings(75.0, 0.0, 0.04);
        assert_eq!(warnings, vec![OVERBOUGHT_WARNING, HIGH_VOLATILITY_WARNING]);

        let warnings = collect_warnings(20.0, -80.0, 0.031);
        assert_eq!(
            warnings,
            vec![OVERSOLD_WARNING, UNUSUAL_VOLUME_WARNING, HIGH_VOLATILITY_WARNING]
        );

        assert!(collect_warnings(70.0, 50.0, 0.03).is_empty());
    }

    #[test]
    fn indicator_signals_follow_thresholds() {
        assert_eq!(rsi_indicator(71.0).signal, Signal::Sell);
        assert_eq!(rsi_indicator(29.0).signal, Signal::Buy);
        assert_eq!(rsi_indicator(70.0).signal, Signal::Neutral);

        let cross = sma_cross_indicator(105.0, 100.0);
        assert_eq!((cross.value, cross.signal), (5.0, Signal::Buy));
        assert_eq!(sma_cross_indicator(0.0, 0.0).signal, Signal::Neutral);

        assert_eq!(volume_indicator(20.5).signal, Signal::Buy);
        assert_eq!(volume_indicator(-21.0).signal, Signal::Sell);
        assert_eq!(volume_indicator(20.0).signal, Signal::Neutral);
    }

    #[test]
    fn short_history_uses_fallbacks() {
        let analyzer = AnalyzerImpl::new();
        let report = analyzer
            .analyze_market("BTC/USD", &[100.0, 150.0], &[1000.0, 1000.0])
            .unwrap();

        assert_eq!(report.price.change, 50.0);
        assert_eq!(report.price.change_percent, 50.0);
        assert_eq!(report.technical_indicators[0].value, 50.0);
        assert_eq!(report.technical_indicators[1].value, 0.0);
        assert_eq!(report.technical_indicators[1].signal, Signal::Neutral);
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert!(report.warnings.is_empty());
        // No signals, volume flat: 0.4 negative + 0.3 negative + 0.3 positive
        assert_eq!(report.sentiment.overall, Outlook::Bearish);
        assert_eq!(report.recommended_action, RecommendedAction::Hold);
    }

    #[test]
    fn rejects_too_short_series() {
        let err = AnalyzerImpl::new()
            .analyze_market("X", &[1.0], &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to analyze market data");
        assert!(matches!(
            err.fault(),
            AnalysisFault::Input(InputError::TooShort { series: "price", len: 1 })
        ));
    }

    #[test]
    fn rejects_zero_previous_volume() {
        let err = AnalyzerImpl::new()
            .analyze_market("X", &[1.0, 2.0], &[0.0, 5.0])
            .unwrap_err();
        assert!(matches!(
            err.fault(),
            AnalysisFault::Input(InputError::ZeroPrevious { series: "volume" })
        ));
    }

    #[test]
    fn rejects_non_finite_samples() {
        let err = AnalyzerImpl::new()
            .analyze_market("X", &[1.0, f64::NAN, 2.0], &[1.0, 1.0, 1.0])
            .unwrap_err();
        assert!(matches!(
            err.fault(),
            AnalysisFault::Input(InputError::NonFinite { series: "price", index: 1 })
        ));
    }

    #[test]
    fn rejects_overflowing_results() {
        let err = AnalyzerImpl::new()
            .analyze_market("X", &[1e-300, f64::MAX], &[1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err.fault(), AnalysisFault::NonFiniteResult("price change percent")));
    }

    #[test]
    fn rejects_non_positive_price_in_window() {
        let analyzer = AnalyzerImpl::new();
        let volumes = vec![1000.0; 30];
        for bad in [0.0, -50.0] {
            let mut prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
            prices[25] = bad;
            let err = analyzer.analyze_market("X", &prices, &volumes).unwrap_err();
            assert!(matches!(
                err.fault(),
                AnalysisFault::Input(InputError::OutOfRange { series: "price", index: 25, .. })
            ));
        }
    }

    #[test]
    fn rejects_negative_volume_but_allows_zero() {
        let analyzer = AnalyzerImpl::new();
        let prices = [10.0, 11.0, 12.0];

        let report = analyzer.analyze_market("X", &prices, &[0.0, 5.0, 6.0]).unwrap();
        assert_eq!(report.volume.value, 6.0);

        let err = analyzer
            .analyze_market("X", &prices, &[5.0, -1.0, 6.0])
            .unwrap_err();
        assert!(matches!(
            err.fault(),
            AnalysisFault::Input(InputError::OutOfRange { series: "volume", index: 1, .. })
        ));
    }

    #[test]
    fn only_panics_count_as_already_reported() {
        assert!(AnalysisFault::Panicked("boom".into()).already_reported());
        assert!(!AnalysisFault::NonFiniteResult("price").already_reported());
        assert!(!AnalysisFault::Input(InputError::ZeroPrevious { series: "price" }).already_reported());
    }

    #[test]
    fn error_keeps_cause() {
        use std::error::Error;
        let err = AnalyzerImpl::new()
            .analyze_market("X", &[], &[])
            .unwrap_err();
        let cause = err.source().map(|c| c.to_string());
        assert_eq!(cause.as_deref(), Some("price series has 0 samples, need at least 2"));
    }
}

use crate::model::{Impact, MarketSentiment, Outlook, RiskLevel, SentimentFactor, Signal, TechnicalIndicator};

const TECHNICAL_WEIGHT: f64 = 0.4;
const VOLUME_WEIGHT: f64 = 0.3;
const PRICE_ACTION_WEIGHT: f64 = 0.3;
const SENTIMENT_THRESHOLD: f64 = 0.2;
/// Sentiment confidence is a fixed figure, not derived from the score.
pub const SENTIMENT_CONFIDENCE: f64 = 0.7;

/// Sums three tiered checks (1 to 3 points each) into a score between 3 and 9.
pub fn risk_score(volatility: f64, rsi: f64, volume_change_percent: f64) -> u8 {
    let volatility_points = if volatility > 0.03 {
        3
    } else if volatility > 0.02 {
        2
    } else {
        1
    };

    let rsi_points = if rsi > 70.0 || rsi < 30.0 {
        3
    } else if rsi > 65.0 || rsi < 35.0 {
        2
    } else {
        1
    };

    let volume_change = volume_change_percent.abs();
    let volume_points = if volume_change > 50.0 {
        3
    } else if volume_change > 25.0 {
        2
    } else {
        1
    };

    volatility_points + rsi_points + volume_points
}

pub fn assess_risk(volatility: f64, rsi: f64, volume_change_percent: f64) -> RiskLevel {
    match risk_score(volatility, rsi, volume_change_percent) {
        score if score >= 7 => RiskLevel::High,
        score if score >= 4 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Number of buy and sell signals among `indicators`.
pub fn count_signals(indicators: &[TechnicalIndicator]) -> (usize, usize) {
    indicators.iter().fold((0, 0), |(buys, sells), ind| match ind.signal {
        Signal::Buy => (buys + 1, sells),
        Signal::Sell => (buys, sells + 1),
        Signal::Neutral => (buys, sells),
    })
}

fn factor(name: &str, positive: bool, weight: f64) -> SentimentFactor {
    SentimentFactor {
        name: name.to_string(),
        impact: if positive { Impact::Positive } else { Impact::Negative },
        weight,
    }
}

/// Combines indicator majority, volume change and price change into an
/// overall directional sentiment.
pub fn sentiment(
    indicators: &[TechnicalIndicator],
    volume_change_percent: f64,
    price_change: f64,
) -> MarketSentiment {
    let (buys, sells) = count_signals(indicators);

    let factors = vec![
        factor("Technical Indicators", buys > sells, TECHNICAL_WEIGHT),
        factor("Volume Analysis", volume_change_percent > 0.0, VOLUME_WEIGHT),
        factor("Price Action", price_change > 0.0, PRICE_ACTION_WEIGHT),
    ];

    let score: f64 = factors
        .iter()
        .map(|f| match f.impact {
            Impact::Positive => f.weight,
            _ => -f.weight,
        })
        .sum();

    let overall = if score > SENTIMENT_THRESHOLD {
        Outlook::Bullish
    } else if score < -SENTIMENT_THRESHOLD {
        Outlook::Bearish
    } else {
        Outlook::Neutral
    };

    MarketSentiment {
        overall,
        confidence: SENTIMENT_CONFIDENCE,
        factors,
    }
}

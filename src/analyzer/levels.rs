use crate::model::{LevelStrength, LevelType, SupportResistance};
use crate::utils::round2;

/// Derives two support and two resistance levels around `current_price`,
/// spaced by a tenth of the historical price range.
///
/// Output order: strong support, medium support, strong resistance, medium resistance.
pub fn support_resistance(prices: &[f64], current_price: f64) -> Vec<SupportResistance> {
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let step = if prices.is_empty() { 0.0 } else { (max - min) / 10.0 };

    let level = |offset: f64, level_type, strength| SupportResistance {
        level: round2(current_price + offset),
        level_type,
        strength,
    };

    vec![
        level(-step, LevelType::Support, LevelStrength::Strong),
        level(-step * 2.0, LevelType::Support, LevelStrength::Medium),
        level(step, LevelType::Resistance, LevelStrength::Strong),
        level(step * 2.0, LevelType::Resistance, LevelStrength::Medium),
    ]
}

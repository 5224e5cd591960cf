/// Arithmetic mean of the last `period` prices, or `0.0` when there are fewer
/// than `period` of them.
pub fn moving_average(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }
    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// RSI (Relative Strength Index) over the last `period` price deltas.
///
/// Returns `50.0` when fewer than `period + 1` prices are available, and also
/// for a flat window where there are neither gains nor losses. A window
/// without losses yields `100.0`.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for w in prices[prices.len() - period - 1..].windows(2) {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Population standard deviation of the relative returns inside the trailing
/// `period` prices. The first return of the window counts as `0`.
pub fn volatility(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }

    let window = &prices[prices.len() - period..];
    let returns: Vec<f64> = std::iter::once(0.0)
        .chain(window.windows(2).map(|w| (w[1] - w[0]) / w[0]))
        .collect();

    let count = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / count;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / count;
    variance.sqrt()
}

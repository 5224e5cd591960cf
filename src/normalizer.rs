use crate::model::MarketSeries;
use tracing::warn;

/// Trims the longer series from the front so both end on the latest sample.
pub fn align_series(series: &mut MarketSeries, symbol: &str) {
    let len = series.prices.len().min(series.volumes.len());

    for (name, values) in [("prices", &mut series.prices), ("volumes", &mut series.volumes)] {
        let excess = values.len() - len;
        if excess > 0 {
            warn!(symbol, dropped = excess, "Series length mismatch, trimming oldest {}", name);
            values.drain(..excess);
        }
    }
}

// Mock market data for demos: a bounded random walk
use crate::model::{MarketSeries, SourceError};
use crate::source::traits::SeriesSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest price the walk may reach, as a fraction of the start price.
const PRICE_FLOOR: f64 = 0.01;

pub struct DemoSource {
    pub points: usize,
    pub start_price: f64,
    /// Largest relative move between two samples.
    pub step_volatility: f64,
    pub base_volume: f64,
    /// Fixed seed for a reproducible series.
    pub seed: Option<u64>,
}

impl DemoSource {
    pub fn generate(&self) -> MarketSeries {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let floor = self.start_price * PRICE_FLOOR;
        let mut price = self.start_price;
        let mut prices = Vec::with_capacity(self.points);
        let mut volumes = Vec::with_capacity(self.points);

        for _ in 0..self.points {
            prices.push(price);
            // Volumes swing between 50% and 150% of the base.
            volumes.push(self.base_volume * rng.random_range(0.5..1.5));

            let step = if self.step_volatility > 0.0 {
                rng.random_range(-self.step_volatility..self.step_volatility)
            } else {
                0.0
            };
            price = (price * (1.0 + step)).max(floor);
        }

        MarketSeries { prices, volumes }
    }
}

#[async_trait::async_trait]
impl SeriesSource for DemoSource {
    async fn fetch(&self, symbol: &str) -> Result<MarketSeries, SourceError> {
        if self.points == 0 {
            return Err(SourceError::NoData(symbol.to_string()));
        }
        Ok(self.generate())
    }
}

pub mod traits;
pub mod file;
pub mod demo;

pub use demo::DemoSource;
pub use file::FileSource;
pub use traits::SeriesSource;

use crate::config::SourceConfig;

/// Builds the source described by a market's config entry.
pub fn from_config(cfg: &SourceConfig) -> Box<dyn SeriesSource> {
    match cfg {
        SourceConfig::File { path } => Box::new(FileSource::new(path)),
        SourceConfig::Demo {
            points,
            start_price,
            step_volatility,
            base_volume,
            seed,
        } => Box::new(DemoSource {
            points: *points,
            start_price: *start_price,
            step_volatility: *step_volatility,
            base_volume: *base_volume,
            seed: *seed,
        }),
    }
}

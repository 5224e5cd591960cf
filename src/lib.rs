//! Technical market analysis: turns a price/volume history into a report with
//! indicators, support/resistance levels, sentiment, risk and a recommended
//! action. The surrounding modules feed it series and keep what it returns.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod source;
pub mod storage;
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerImpl};
pub use model::{AnalysisError, MarketAnalysis, MarketSeries};

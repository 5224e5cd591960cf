// Analyzer module: indicator engine, level generator, risk/sentiment assessor
// and the report assembler on top of them.

pub mod indicators;
pub mod levels;
pub mod assessment;
pub mod market_analysis;

// Re-export the main Analyzer implementation for ease of use.
pub use market_analysis::{Analyzer, AnalyzerImpl};

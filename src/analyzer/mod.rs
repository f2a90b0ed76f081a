// Analyzer module: snapshot decoding, regression models and the trend analyzer.

pub mod regression;
pub mod series;
pub mod trend;

pub use trend::TrendAnalyzer;

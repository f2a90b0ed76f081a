pub mod generator;
pub mod scorer;

pub use generator::StrategyGenerator;
pub use scorer::{ScoringPolicy, StrategyScorer};

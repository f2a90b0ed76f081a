pub mod collector;
pub mod traits;

pub use collector::DataCollector;
pub use traits::MarketDataSource;

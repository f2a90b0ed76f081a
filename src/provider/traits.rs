use crate::model::{CustomerRecord, MarketDataSnapshot};

/// Upstream feeds. `None` means "no data" and is a handled outcome, never a fault.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_market_trends(&self) -> Option<MarketDataSnapshot>;
    async fn collect_customer_data(&self) -> Option<Vec<CustomerRecord>>;
}

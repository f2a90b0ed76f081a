use crate::model::{CustomerRecord, MarketDataSnapshot};
use crate::observer::Observer;
use crate::provider::traits::MarketDataSource;
use crate::storage::{CUSTOMER_DATA_KEY, MARKET_DATA_KEY, Namespace, StateStore};
use std::sync::Arc;
use tracing::warn;

const COMPONENT: &str = "data_collector";

/// Reads cached market and customer hashes from the market-data namespace.
pub struct DataCollector {
    store: Arc<dyn StateStore>,
    observer: Arc<dyn Observer>,
}

impl DataCollector {
    pub fn new(store: Arc<dyn StateStore>, observer: Arc<dyn Observer>) -> Self {
        Self { store, observer }
    }

    fn parse_customer(customer_id: &str, amount: &str) -> Option<CustomerRecord> {
        let customer_id = customer_id.trim().parse::<u64>().ok()?;
        let purchase_amount = amount.trim().parse::<f64>().ok()?;
        if !purchase_amount.is_finite() || purchase_amount < 0.0 {
            return None;
        }
        Some(CustomerRecord {
            customer_id,
            purchase_amount,
        })
    }
}

#[async_trait::async_trait]
impl MarketDataSource for DataCollector {
    async fn fetch_market_trends(&self) -> Option<MarketDataSnapshot> {
        match self.store.hgetall(Namespace::MarketData, MARKET_DATA_KEY).await {
            Ok(data) if data.is_empty() => {
                self.observer
                    .failure(COMPONENT, "Failed to fetch market trends: key market_data is empty");
                None
            }
            Ok(data) => {
                self.observer
                    .success(COMPONENT, "Market trends fetched successfully");
                Some(data)
            }
            Err(e) => {
                self.observer
                    .failure(COMPONENT, &format!("Failed to fetch market trends: {}", e));
                None
            }
        }
    }

    async fn collect_customer_data(&self) -> Option<Vec<CustomerRecord>> {
        let raw = match self.store.hgetall(Namespace::MarketData, CUSTOMER_DATA_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                self.observer
                    .failure(COMPONENT, &format!("Failed to collect customer data: {}", e));
                return None;
            }
        };

        let mut records: Vec<CustomerRecord> = raw
            .iter()
            .filter_map(|(id, amount)| {
                let parsed = Self::parse_customer(id, amount);
                if parsed.is_none() {
                    warn!(customer_id = %id, value = %amount, "Skipping malformed customer row");
                }
                parsed
            })
            .collect();

        if records.is_empty() {
            self.observer
                .failure(COMPONENT, "Failed to collect customer data: no usable rows");
            return None;
        }

        records.sort_by_key(|r| r.customer_id);
        self.observer
            .success(COMPONENT, "Customer data collected successfully");
        Some(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::recording::RecordingObserver;
    use crate::storage::MemoryStore;

    fn collector(store: Arc<MemoryStore>) -> (DataCollector, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        (DataCollector::new(store, observer.clone()), observer)
    }

    #[tokio::test]
    async fn missing_market_data_is_no_data() {
        let (collector, observer) = collector(Arc::new(MemoryStore::new()));
        assert!(collector.fetch_market_trends().await.is_none());
        assert_eq!(observer.failures(COMPONENT), 1);
    }

    #[tokio::test]
    async fn store_failure_is_no_data() {
        let store = Arc::new(MemoryStore::new());
        store.seed(Namespace::MarketData, MARKET_DATA_KEY, &[("date", "[]")]);
        store.set_unavailable(true);
        let (collector, observer) = collector(store);

        assert!(collector.fetch_market_trends().await.is_none());
        assert!(collector.collect_customer_data().await.is_none());
        assert_eq!(observer.failures(COMPONENT), 2);
    }

    #[tokio::test]
    async fn fetches_snapshot_fields_verbatim() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            Namespace::MarketData,
            MARKET_DATA_KEY,
            &[("date", "[\"2024-01-01\"]"), ("revenue", "[100]")],
        );
        let (collector, observer) = collector(store);

        let snapshot = collector.fetch_market_trends().await.unwrap();
        assert_eq!(snapshot["revenue"], "[100]");
        assert_eq!(observer.successes(COMPONENT), 1);
    }

    #[tokio::test]
    async fn customer_rows_skip_malformed_entries() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            Namespace::MarketData,
            CUSTOMER_DATA_KEY,
            &[("2", "200"), ("1", "100"), ("x", "5"), ("3", "-1")],
        );
        let (collector, _) = collector(store);

        let records = collector.collect_customer_data().await.unwrap();
        assert_eq!(
            records,
            vec![
                CustomerRecord { customer_id: 1, purchase_amount: 100.0 },
                CustomerRecord { customer_id: 2, purchase_amount: 200.0 },
            ]
        );
    }

    #[tokio::test]
    async fn market_cache_ignores_tracking_namespace() {
        let store = Arc::new(MemoryStore::new());
        store.seed(Namespace::Tracking, MARKET_DATA_KEY, &[("date", "[]")]);
        let (collector, _) = collector(store);
        assert!(collector.fetch_market_trends().await.is_none());
    }
}

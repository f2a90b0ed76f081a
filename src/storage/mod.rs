// Storage module: hash-per-key state store with isolated namespaces.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::model::StoreError;
use std::collections::HashMap;

pub const MARKET_DATA_KEY: &str = "market_data";
pub const CUSTOMER_DATA_KEY: &str = "customer_data";

/// Logical partitions inside one store. Keys never collide across namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    MarketData,
    Tracking,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::MarketData => "market_data",
            Namespace::Tracking => "tracking",
        }
    }
}

/// HGETALL/HSET over a namespaced key space.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// Returns every field of the hash, or an empty map when the key is absent.
    async fn hgetall(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError>;

    /// Writes all fields in one step: either every field lands or none does.
    async fn hset(
        &self,
        namespace: Namespace,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError>;
}

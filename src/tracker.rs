use crate::model::{ImplementationRecord, ImplementationStatus, StoreError};
use crate::observer::Observer;
use crate::storage::{Namespace, StateStore};
use crate::utils::parse_datetime;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

const COMPONENT: &str = "implementation_tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// A new record was written.
    Recorded(ImplementationRecord),
    /// The id already reached a terminal state; nothing was written.
    AlreadyRecorded(ImplementationRecord),
    /// Persistence failed. The record only exists in memory.
    Failed {
        record: ImplementationRecord,
        reason: String,
    },
}

impl TrackOutcome {
    pub fn status(&self) -> TrackStatus {
        match self {
            TrackOutcome::Recorded(_) => TrackStatus::Success,
            TrackOutcome::AlreadyRecorded(_) | TrackOutcome::Failed { .. } => TrackStatus::Failure,
        }
    }

    pub fn record(&self) -> &ImplementationRecord {
        match self {
            TrackOutcome::Recorded(record)
            | TrackOutcome::AlreadyRecorded(record)
            | TrackOutcome::Failed { record, .. } => record,
        }
    }
}

type Slot = Arc<AsyncMutex<()>>;

/// Records strategy rollouts under `strategy_{id}` in the tracking namespace.
/// The first outcome for an id is final: implemented records live in the
/// store, failed ones only in memory since they could not be persisted.
pub struct ImplementationTracker {
    store: Arc<dyn StateStore>,
    observer: Arc<dyn Observer>,
    /// Per-id locks, present only while a call for that id is in flight.
    slots: Mutex<HashMap<String, Slot>>,
    failed: Mutex<HashMap<String, ImplementationRecord>>,
}

pub fn tracking_key(strategy_id: &str) -> String {
    format!("strategy_{}", strategy_id)
}

impl ImplementationTracker {
    pub fn new(store: Arc<dyn StateStore>, observer: Arc<dyn Observer>) -> Self {
        Self {
            store,
            observer,
            slots: Mutex::new(HashMap::new()),
            failed: Mutex::new(HashMap::new()),
        }
    }

    fn acquire_slot(&self, strategy_id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.entry(strategy_id.to_string()).or_default().clone()
    }

    /// Drops the map entry once no other call holds or waits on it.
    fn release_slot(&self, strategy_id: &str, slot: Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        // One reference in the map, one held here.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(strategy_id);
        }
    }

    fn failed_record(&self, strategy_id: &str) -> Option<ImplementationRecord> {
        let failed = self.failed.lock().unwrap_or_else(|p| p.into_inner());
        failed.get(strategy_id).cloned()
    }

    pub async fn track_strategy_implementation(&self, strategy_id: &str) -> TrackStatus {
        self.track(strategy_id).await.status()
    }

    pub async fn track(&self, strategy_id: &str) -> TrackOutcome {
        let slot = self.acquire_slot(strategy_id);
        // Held until the outcome is settled so concurrent calls for one id queue up.
        let guard = slot.lock().await;

        let outcome = match self.failed_record(strategy_id) {
            Some(existing) => TrackOutcome::AlreadyRecorded(existing),
            None => self.persist(strategy_id).await,
        };
        if let TrackOutcome::Failed { record, .. } = &outcome {
            let mut failed = self.failed.lock().unwrap_or_else(|p| p.into_inner());
            failed.insert(strategy_id.to_string(), record.clone());
        }

        drop(guard);
        self.release_slot(strategy_id, slot);

        self.report(strategy_id, &outcome);
        outcome
    }

    async fn persist(&self, strategy_id: &str) -> TrackOutcome {
        match self.implementation_record(strategy_id).await {
            Ok(Some(existing)) => return TrackOutcome::AlreadyRecorded(existing),
            Ok(None) => {}
            Err(e) => return Self::failed(strategy_id, e),
        }

        let record = ImplementationRecord {
            strategy_id: strategy_id.to_string(),
            timestamp: Utc::now(),
            status: ImplementationStatus::Implemented,
        };
        let timestamp = record.timestamp.to_rfc3339();
        let fields = [
            ("timestamp", timestamp.as_str()),
            ("status", record.status.as_str()),
        ];

        match self
            .store
            .hset(Namespace::Tracking, &tracking_key(strategy_id), &fields)
            .await
        {
            Ok(()) => TrackOutcome::Recorded(record),
            Err(e) => Self::failed(strategy_id, e),
        }
    }

    fn failed(strategy_id: &str, error: StoreError) -> TrackOutcome {
        TrackOutcome::Failed {
            record: ImplementationRecord {
                strategy_id: strategy_id.to_string(),
                timestamp: Utc::now(),
                status: ImplementationStatus::Failed,
            },
            reason: error.to_string(),
        }
    }

    /// Reads back the persisted record, if any.
    pub async fn implementation_record(
        &self,
        strategy_id: &str,
    ) -> Result<Option<ImplementationRecord>, StoreError> {
        let key = tracking_key(strategy_id);
        let hash = self.store.hgetall(Namespace::Tracking, &key).await?;
        if hash.is_empty() {
            return Ok(None);
        }

        let malformed = |reason: &str| StoreError::Malformed {
            key: key.clone(),
            reason: reason.to_string(),
        };
        let timestamp = hash
            .get("timestamp")
            .and_then(|raw| parse_datetime(raw))
            .ok_or_else(|| malformed("missing or invalid timestamp"))?;
        let status = hash
            .get("status")
            .and_then(|raw| ImplementationStatus::parse(raw))
            .ok_or_else(|| malformed("missing or unknown status"))?;

        Ok(Some(ImplementationRecord {
            strategy_id: strategy_id.to_string(),
            timestamp,
            status,
        }))
    }

    fn report(&self, strategy_id: &str, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Recorded(_) => self.observer.success(
                COMPONENT,
                &format!("Strategy {} implementation tracked successfully", strategy_id),
            ),
            TrackOutcome::AlreadyRecorded(existing) => self.observer.failure(
                COMPONENT,
                &format!(
                    "Strategy {} already tracked as {} at {}",
                    strategy_id,
                    existing.status,
                    existing.timestamp.to_rfc3339()
                ),
            ),
            TrackOutcome::Failed { reason, .. } => self.observer.failure(
                COMPONENT,
                &format!("Failed to track strategy implementation {}: {}", strategy_id, reason),
            ),
        }
    }
}

// Core structs: TrendRecord, AnalysisResult, Strategy, ImplementationRecord
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Raw hash fetched from the `market_data` key. Values are left untouched until
/// the analyzer decodes them.
pub type MarketDataSnapshot = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendRecord {
    pub date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: u64,
    pub purchase_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub customers: usize,
    pub total_purchase: f64,
    pub mean_purchase: f64,
}

impl CustomerSummary {
    pub fn from_records(records: &[CustomerRecord]) -> Self {
        let total: f64 = records.iter().map(|r| r.purchase_amount).sum();
        let mean = if records.is_empty() {
            0.0
        } else {
            total / records.len() as f64
        };
        Self {
            customers: records.len(),
            total_purchase: total,
            mean_purchase: mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub date: NaiveDate,
    pub predicted_revenue: f64,
}

/// Fitted line plus the training baseline it was measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    pub slope_per_day: f64,
    pub intercept: f64,
    /// Mean revenue over the training subset.
    pub baseline_revenue: f64,
    pub training_samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Held-out predictions, ascending by date.
    pub predictions: Vec<Prediction>,
    pub training_dates: Vec<NaiveDate>,
    pub fit: TrendFit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub expected_roi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredStrategy {
    pub strategy: Strategy,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplementationStatus {
    Implemented,
    Failed,
}

impl ImplementationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationStatus::Implemented => "implemented",
            ImplementationStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "implemented" => Some(ImplementationStatus::Implemented),
            "failed" => Some(ImplementationStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationRecord {
    pub strategy_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: ImplementationStatus,
}

/// Closed set of model slots. Only linear regression is backed by an
/// implementation today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    LinearRegression,
    TimeSeriesForecast,
    CustomerSegmentation,
}

impl ModelCapability {
    pub fn is_implemented(&self) -> bool {
        matches!(self, ModelCapability::LinearRegression)
    }
}

impl fmt::Display for ModelCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelCapability::LinearRegression => "linear_regression",
            ModelCapability::TimeSeriesForecast => "time_series_forecast",
            ModelCapability::CustomerSegmentation => "customer_segmentation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("write rejected for key {0}")]
    WriteRejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record under {key}: {reason}")]
    Malformed { key: String, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("schema error: {0}")]
    Schema(String),
    #[error("fit error: {0}")]
    Fit(String),
    #[error("model capability not implemented: {0}")]
    CapabilityUnavailable(ModelCapability),
}

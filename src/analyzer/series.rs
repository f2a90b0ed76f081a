use crate::model::{AnalysisError, MarketDataSnapshot, TrendRecord};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;

pub const DATE_FIELD: &str = "date";
pub const REVENUE_FIELD: &str = "revenue";

/// Fails fast when either required column is missing, before anything is parsed.
pub fn require_fields(snapshot: &MarketDataSnapshot) -> Result<(), AnalysisError> {
    for field in [DATE_FIELD, REVENUE_FIELD] {
        if !snapshot.contains_key(field) {
            return Err(AnalysisError::Schema(format!(
                "{} column missing from market trend data",
                field
            )));
        }
    }
    Ok(())
}

/// Decodes the `date`/`revenue` JSON arrays into records sorted by date.
pub fn decode_records(snapshot: &MarketDataSnapshot) -> Result<Vec<TrendRecord>, AnalysisError> {
    require_fields(snapshot)?;

    let dates = parse_array(DATE_FIELD, &snapshot[DATE_FIELD])?
        .iter()
        .map(parse_date)
        .collect::<Result<Vec<_>, _>>()?;
    let revenues = parse_array(REVENUE_FIELD, &snapshot[REVENUE_FIELD])?
        .iter()
        .map(parse_revenue)
        .collect::<Result<Vec<_>, _>>()?;

    if dates.len() != revenues.len() {
        return Err(AnalysisError::Schema(format!(
            "date has {} entries but revenue has {}",
            dates.len(),
            revenues.len()
        )));
    }

    let mut seen = HashSet::new();
    for date in &dates {
        if !seen.insert(*date) {
            return Err(AnalysisError::Schema(format!("duplicate date {}", date)));
        }
    }

    let mut records: Vec<TrendRecord> = dates
        .into_iter()
        .zip(revenues)
        .map(|(date, revenue)| TrendRecord { date, revenue })
        .collect();
    records.sort_by_key(|r| r.date);
    Ok(records)
}

fn parse_array(field: &str, raw: &str) -> Result<Vec<Value>, AnalysisError> {
    serde_json::from_str::<Vec<Value>>(raw)
        .map_err(|e| AnalysisError::Schema(format!("{} is not a JSON array: {}", field, e)))
}

fn parse_date(value: &Value) -> Result<NaiveDate, AnalysisError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| AnalysisError::Schema(format!("invalid date value {}", value)))
}

fn parse_revenue(value: &Value) -> Result<f64, AnalysisError> {
    let revenue = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AnalysisError::Schema(format!("invalid revenue value {}", value)))?;

    if !revenue.is_finite() || revenue < 0.0 {
        return Err(AnalysisError::Schema(format!(
            "revenue must be finite and non-negative, got {}",
            revenue
        )));
    }
    Ok(revenue)
}

use crate::analyzer::trend::{DEFAULT_SEED, DEFAULT_TEST_RATIO};
use crate::model::ModelCapability;
use crate::strategy::ScoringPolicy;
use crate::strategy::generator::DEFAULT_FLAT_BAND_PCT;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "amso.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub model: ModelCapability,
    /// Share of records held out from training.
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: ModelCapability::LinearRegression,
            test_ratio: DEFAULT_TEST_RATIO,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Monthly change (in percent) treated as a flat trend.
    pub flat_band_pct: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            flat_band_pct: DEFAULT_FLAT_BAND_PCT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// How many of the best-ranked strategies get tracked per run.
    pub top_n: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { top_n: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub analysis: AnalysisConfig,
    pub scoring: ScoringPolicy,
    pub generation: GenerationConfig,
    pub selection: SelectionConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            analysis: AnalysisConfig::default(),
            scoring: ScoringPolicy::default(),
            generation: GenerationConfig::default(),
            selection: SelectionConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.analysis.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "analysis.test_ratio must be in (0, 1), got {}",
                ratio
            )));
        }
        if self.selection.top_n == 0 {
            return Err(ConfigError::Invalid("selection.top_n must be at least 1".into()));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log_level {}", self.log_level)));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.analysis.model, ModelCapability::LinearRegression);
        assert_eq!(config.analysis.test_ratio, 0.2);
        assert_eq!(config.analysis.seed, 42);
        assert_eq!(config.scoring, ScoringPolicy::default());
        assert_eq!(config.selection.top_n, 1);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"{
                "analysis": { "model": "customer_segmentation" },
                "scoring": { "description_weight": 0.0 },
                "log_level": "debug"
            }"#,
        )
        .unwrap();
        assert_eq!(config.analysis.model, ModelCapability::CustomerSegmentation);
        assert_eq!(config.analysis.test_ratio, 0.2);
        assert_eq!(config.scoring, ScoringPolicy::roi_only());
    }

    #[test]
    fn rejects_out_of_range_values() {
        for raw in [
            r#"{ "analysis": { "test_ratio": 1.0 } }"#,
            r#"{ "analysis": { "test_ratio": 0 } }"#,
            r#"{ "selection": { "top_n": 0 } }"#,
            r#"{ "log_level": "loud" }"#,
        ] {
            assert!(matches!(parse_config(raw), Err(ConfigError::Invalid(_))), "{raw}");
        }
        assert!(matches!(
            parse_config(r#"{ "analysis": { "model": "neural_net" } }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}

use crate::error::{AnalyticsError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    #[schemars(description = "Seconds a cached aggregate stays fresh. Default 300.")]
    pub ttl_seconds: u64,

    #[schemars(description = "Entry count above which the oldest entries are evicted. Default 100.")]
    pub max_entries: usize,

    #[schemars(description = "How many of the oldest entries to evict on overflow. Default 20.")]
    pub eviction_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_entries: 100,
            eviction_batch: 20,
        }
    }
}

/// Percent thresholds used by the insight rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct InsightThresholds {
    #[schemars(description = "Share of expenses above which the top category becomes actionable")]
    pub dominant_category_share: f64,

    #[schemars(description = "Absolute income change (percent) needed to report it")]
    pub income_change: f64,

    #[schemars(description = "Absolute expense change (percent) needed to report it")]
    pub expense_change: f64,

    #[schemars(description = "Absolute change (percent) above which a change insight is high severity")]
    pub high_severity_change: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            dominant_category_share: 40.0,
            income_change: 10.0,
            expense_change: 15.0,
            high_severity_change: 25.0,
        }
    }
}

/// Low-balance tiers. A month matches the first tier in the order
/// `balance <= critical`, `balance < warning`, `balance < caution`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct RiskThresholds {
    pub critical: f64,
    pub warning: f64,
    pub caution: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical: 0.0,
            warning: 100.0,
            caution: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ProjectionConfig {
    #[schemars(description = "Months projected when a request does not say. Default 6.")]
    pub default_months: usize,

    pub risk_thresholds: RiskThresholds,

    #[schemars(description = "Confidence reported on fallback projections. Default 0.1.")]
    pub fallback_confidence: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            default_months: 6,
            risk_thresholds: RiskThresholds::default(),
            fallback_confidence: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub cache: CacheConfig,
    pub insights: InsightThresholds,
    pub projection: ProjectionConfig,
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalyticsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_seconds == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "cache.ttl_seconds must be greater than 0".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "cache.max_entries must be at least 1".to_string(),
            ));
        }
        if self.cache.eviction_batch == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "cache.eviction_batch must be at least 1".to_string(),
            ));
        }

        let insight_values = [
            self.insights.dominant_category_share,
            self.insights.income_change,
            self.insights.expense_change,
            self.insights.high_severity_change,
        ];
        if insight_values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnalyticsError::InvalidConfig(
                "insight thresholds must be finite and non-negative".to_string(),
            ));
        }

        let risk = &self.projection.risk_thresholds;
        if [risk.critical, risk.warning, risk.caution]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(AnalyticsError::InvalidConfig(
                "risk thresholds must be finite".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.projection.fallback_confidence) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "projection.fallback_confidence {} is outside [0, 1]",
                self.projection.fallback_confidence
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.cache.max_entries, 100);
        assert_eq!(config.cache.eviction_batch, 20);
        assert_eq!(config.projection.default_months, 6);
        assert_eq!(config.projection.risk_thresholds.warning, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalyticsConfig::from_json_str(
            r#"{"cache": {"ttl_seconds": 60}, "projection": {"risk_thresholds": {"warning": 600}}}"#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.max_entries, 100);
        assert_eq!(config.projection.risk_thresholds.warning, 600.0);
        assert_eq!(config.projection.risk_thresholds.caution, 500.0);
        assert_eq!(config.insights.expense_change, 15.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = AnalyticsConfig::from_json_str(r#"{"cache": {"max_entries": 0}}"#);
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));

        let result =
            AnalyticsConfig::from_json_str(r#"{"projection": {"fallback_confidence": 2.0}}"#);
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));

        let result = AnalyticsConfig::from_json_str("{not json");
        assert!(matches!(result, Err(AnalyticsError::SerializationError(_))));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = AnalyticsConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("ttl_seconds"));
        assert!(schema_json.contains("risk_thresholds"));
    }
}

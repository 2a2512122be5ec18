use crate::config::{ProjectionConfig, RiskThresholds};
use crate::consolidation;
use crate::projector::{self, BalanceProjection, ProjectionOutcome, ProjectionRequest, ProjectionSummary};
use crate::risk::{self, RiskWarning};
use crate::scenario::{self, ScenarioComparison};
use crate::schema::ScenarioAdjustment;
use log::info;
use serde::{Deserialize, Serialize};

/// Everything the presentation layer shows for one account's outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceForecastReport {
    pub projections: Vec<BalanceProjection>,
    pub summary: ProjectionSummary,
    pub low_balance_warnings: Vec<RiskWarning>,
    pub overdraft_warnings: Vec<RiskWarning>,
    pub credit_warnings: Vec<RiskWarning>,
    pub is_fallback: bool,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BalancePredictor {
    config: ProjectionConfig,
}

impl BalancePredictor {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.config.risk_thresholds
    }

    pub fn project(&self, request: &ProjectionRequest) -> ProjectionOutcome {
        projector::project_balances(request, &self.config)
    }

    pub fn detect_low_balance(&self, projections: &[BalanceProjection]) -> Vec<RiskWarning> {
        risk::detect_low_balance(projections, &self.config.risk_thresholds)
    }

    pub fn detect_low_balance_with(&self, projections: &[BalanceProjection], thresholds: &RiskThresholds) -> Vec<RiskWarning> {
        risk::detect_low_balance(projections, thresholds)
    }

    pub fn detect_overdraft(&self, projections: &[BalanceProjection]) -> Vec<RiskWarning> {
        risk::detect_overdraft(projections)
    }

    pub fn detect_credit_utilization(&self, projections: &[BalanceProjection], credit_limit: f64) -> Vec<RiskWarning> {
        risk::detect_credit_utilization(projections, credit_limit)
    }

    pub fn apply_scenario(&self, baseline: &[BalanceProjection], adjustment: &ScenarioAdjustment) -> Vec<BalanceProjection> {
        scenario::apply_scenario(baseline, adjustment)
    }

    pub fn compare_scenario(&self, baseline: &[BalanceProjection], adjustment: &ScenarioAdjustment) -> ScenarioComparison {
        scenario::compare_scenario(baseline, adjustment)
    }

    pub fn consolidate(&self, accounts: &[Vec<BalanceProjection>]) -> Vec<BalanceProjection> {
        consolidation::consolidate(accounts)
    }

    /// Projects, runs every detector and summarizes in one pass.
    /// Credit utilization is only scanned when `credit_limit` is given.
    pub fn forecast(&self, request: &ProjectionRequest, credit_limit: Option<f64>) -> BalanceForecastReport {
        let outcome = self.project(request);
        let fallback_reason = match &outcome {
            ProjectionOutcome::Fallback { reason, .. } => Some(reason.clone()),
            ProjectionOutcome::Projected(_) => None,
        };
        let is_fallback = outcome.is_fallback();
        let projections = outcome.into_projections();

        let low_balance_warnings = self.detect_low_balance(&projections);
        let overdraft_warnings = self.detect_overdraft(&projections);
        let credit_warnings = credit_limit
            .map(|limit| self.detect_credit_utilization(&projections, limit))
            .unwrap_or_default();

        info!(
            "Balance forecast over {} months: {} low-balance, {} overdraft, {} credit warnings",
            projections.len(),
            low_balance_warnings.len(),
            overdraft_warnings.len(),
            credit_warnings.len()
        );

        BalanceForecastReport {
            summary: projector::summarize(request.current_balance, &projections),
            projections,
            low_balance_warnings,
            overdraft_warnings,
            credit_warnings,
            is_fallback,
            fallback_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskKind, RiskLevel};
    use crate::schema::ForecastPoint;

    fn request() -> ProjectionRequest {
        ProjectionRequest::new(
            1000.0,
            vec![ForecastPoint::new(2000.0, 0.9)],
            vec![ForecastPoint::new(2500.0, 0.8)],
        )
        .with_months(1)
    }

    #[test]
    fn test_raised_warning_threshold_flags_month() {
        let config = ProjectionConfig {
            risk_thresholds: RiskThresholds {
                warning: 600.0,
                ..RiskThresholds::default()
            },
            ..ProjectionConfig::default()
        };
        let predictor = BalancePredictor::new(config);
        let projections = predictor.project(&request()).into_projections();
        let warnings = predictor.detect_low_balance(&projections);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].month, 1);
        assert_eq!(
            warnings[0].kind,
            RiskKind::LowBalance {
                level: RiskLevel::Warning
            }
        );
    }

    #[test]
    fn test_forecast_report() {
        let predictor = BalancePredictor::default();
        let request = ProjectionRequest::new(
            200.0,
            vec![ForecastPoint::new(1000.0, 0.9); 3],
            vec![ForecastPoint::new(1400.0, 0.7); 3],
        )
        .with_months(3);

        let report = predictor.forecast(&request, Some(1000.0));
        assert!(!report.is_fallback);
        assert_eq!(report.projections.len(), 3);
        assert_eq!(report.summary.final_balance, -1000.0);
        // -200, -600, -1000
        assert_eq!(report.low_balance_warnings.len(), 3);
        assert_eq!(report.overdraft_warnings.len(), 3);
        assert_eq!(report.credit_warnings.len(), 1);
        assert_eq!(report.credit_warnings[0].month, 3);
    }

    #[test]
    fn test_forecast_report_fallback() {
        let predictor = BalancePredictor::default();
        let request = ProjectionRequest::new(
            300.0,
            vec![ForecastPoint::new(f64::INFINITY, 0.9)],
            vec![],
        );
        let report = predictor.forecast(&request, None);

        assert!(report.is_fallback);
        assert!(report.fallback_reason.is_some());
        assert_eq!(report.projections.len(), 6);
        assert!(report.credit_warnings.is_empty());
        assert_eq!(report.low_balance_warnings.len(), 6);
        assert_eq!(report.summary.confidence, 0.1);
    }
}

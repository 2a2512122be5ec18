//! Independent scanners over a projection sequence. No detector shares state with another.

use crate::config::RiskThresholds;
use crate::insights::Severity;
use crate::projector::BalanceProjection;
use crate::utils::{format_money, percentage, round1, round2};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CREDIT_CRITICAL_UTILIZATION: f64 = 95.0;
pub const CREDIT_WARNING_UTILIZATION: f64 = 80.0;

const DAYS_PER_MONTH: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Caution,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "risk_type", rename_all = "snake_case")]
pub enum RiskKind {
    LowBalance { level: RiskLevel },
    Overdraft { severity: Severity, overdraft_amount: f64 },
    CreditUtilization { level: RiskLevel, utilization: f64, credit_limit: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskWarning {
    pub month: u32,
    pub period: String,
    #[serde(flatten)]
    pub kind: RiskKind,
    pub projected_balance: f64,
    pub message: String,
    pub recommendation: String,
    pub days_until: u32,
    pub confidence: f64,
}

impl RiskWarning {
    fn for_month(projection: &BalanceProjection, kind: RiskKind, message: String, recommendation: &str) -> Self {
        Self {
            month: projection.month,
            period: projection.period.clone(),
            kind,
            projected_balance: projection.projected_balance,
            message,
            recommendation: recommendation.to_string(),
            days_until: projection.month.saturating_mul(DAYS_PER_MONTH),
            confidence: projection.confidence,
        }
    }
}

/// One warning per month whose balance falls into a tier, strictest tier first.
pub fn detect_low_balance(projections: &[BalanceProjection], thresholds: &RiskThresholds) -> Vec<RiskWarning> {
    projections
        .iter()
        .filter_map(|p| {
            let balance = p.projected_balance;
            let level = if balance <= thresholds.critical {
                RiskLevel::Critical
            } else if balance < thresholds.warning {
                RiskLevel::Warning
            } else if balance < thresholds.caution {
                RiskLevel::Caution
            } else {
                return None;
            };

            let (message, recommendation) = match level {
                RiskLevel::Critical => (
                    format!("Balance projected to reach {} in {}.", format_money(balance), p.period),
                    "Cut non-essential spending now or move funds in to avoid running out of money.",
                ),
                RiskLevel::Warning => (
                    format!("Balance projected to drop to {} in {}.", format_money(balance), p.period),
                    "Delay large purchases and review upcoming bills.",
                ),
                RiskLevel::Caution => (
                    format!("Balance projected to be low ({}) in {}.", format_money(balance), p.period),
                    "Keep an eye on discretionary spending this month.",
                ),
            };

            Some(RiskWarning::for_month(p, RiskKind::LowBalance { level }, message, recommendation))
        })
        .collect()
}

/// Flags months with a negative balance, graded by how deep the overdraft goes.
pub fn detect_overdraft(projections: &[BalanceProjection]) -> Vec<RiskWarning> {
    projections
        .iter()
        .filter(|p| p.projected_balance < 0.0)
        .map(|p| {
            let overdraft_amount = round2(-p.projected_balance);
            let severity = if overdraft_amount > 500.0 {
                Severity::High
            } else if overdraft_amount > 100.0 {
                Severity::Medium
            } else {
                Severity::Low
            };

            RiskWarning::for_month(
                p,
                RiskKind::Overdraft {
                    severity,
                    overdraft_amount,
                },
                format!(
                    "Account projected to be overdrawn by {} in {}.",
                    format_money(overdraft_amount),
                    p.period
                ),
                "Arrange a transfer or reduce expenses before this month to avoid overdraft fees.",
            )
        })
        .collect()
}

/// Treats a negative balance as debt drawn against `credit_limit`.
/// A non-positive or non-finite limit yields no warnings.
pub fn detect_credit_utilization(projections: &[BalanceProjection], credit_limit: f64) -> Vec<RiskWarning> {
    if !credit_limit.is_finite() || credit_limit <= 0.0 {
        return Vec::new();
    }

    projections
        .iter()
        .filter_map(|p| {
            let debt = (-p.projected_balance).max(0.0);
            let utilization = round1(percentage(debt, credit_limit));

            let (level, recommendation) = if utilization >= CREDIT_CRITICAL_UTILIZATION {
                (
                    RiskLevel::Critical,
                    "Pay down the balance now; you are about to hit your credit limit.",
                )
            } else if utilization >= CREDIT_WARNING_UTILIZATION {
                (
                    RiskLevel::Warning,
                    "Reduce card spending to keep utilization below 80%.",
                )
            } else {
                return None;
            };

            Some(RiskWarning::for_month(
                p,
                RiskKind::CreditUtilization {
                    level,
                    utilization,
                    credit_limit,
                },
                format!(
                    "Credit utilization projected at {}% of {} in {}.",
                    utilization,
                    format_money(credit_limit),
                    p.period
                ),
                recommendation,
            ))
        })
        .collect()
}

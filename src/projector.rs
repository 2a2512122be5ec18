//! Month-by-month balance projection from income and expense forecasts.

use crate::config::ProjectionConfig;
use crate::error::{AnalyticsError, Result};
use crate::schema::ForecastPoint;
use crate::utils::{month_label_after, round2};
use chrono::NaiveDate;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BalanceProjection {
    /// 1-based month offset from the starting point.
    pub month: u32,
    pub period: String,
    pub projected_balance: f64,
    pub net_cash_flow: f64,
    pub income: f64,
    pub expenses: f64,
    /// Weaker of the income and expense forecast confidences.
    pub confidence: f64,
    pub balance_change: f64,
    #[serde(default)]
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectionRequest {
    pub current_balance: f64,

    #[schemars(description = "Income forecast per future month, index 0 being the first month")]
    #[serde(default)]
    pub income_forecasts: Vec<ForecastPoint>,

    #[schemars(description = "Expense forecast per future month, index 0 being the first month")]
    #[serde(default)]
    pub expense_forecasts: Vec<ForecastPoint>,

    #[schemars(description = "Months to project. Falls back to the configured default.")]
    #[serde(default)]
    pub months: Option<usize>,

    #[schemars(description = "Date the projection starts from, used to label months without a forecast period")]
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl ProjectionRequest {
    pub fn new(current_balance: f64, income_forecasts: Vec<ForecastPoint>, expense_forecasts: Vec<ForecastPoint>) -> Self {
        Self {
            current_balance,
            income_forecasts,
            expense_forecasts,
            months: None,
            start_date: None,
        }
    }

    pub fn with_months(mut self, months: usize) -> Self {
        self.months = Some(months);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ProjectionRequest)
    }
}

/// Either a real projection or the flat stand-in produced when the inputs
/// could not be projected.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionOutcome {
    Projected(Vec<BalanceProjection>),
    Fallback {
        projections: Vec<BalanceProjection>,
        reason: String,
    },
}

impl ProjectionOutcome {
    pub fn projections(&self) -> &[BalanceProjection] {
        match self {
            ProjectionOutcome::Projected(projections) => projections,
            ProjectionOutcome::Fallback { projections, .. } => projections,
        }
    }

    pub fn into_projections(self) -> Vec<BalanceProjection> {
        match self {
            ProjectionOutcome::Projected(projections) => projections,
            ProjectionOutcome::Fallback { projections, .. } => projections,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ProjectionOutcome::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectionSummary {
    pub starting_balance: f64,
    pub final_balance: f64,
    pub lowest_balance: f64,
    pub lowest_balance_month: Option<u32>,
    pub total_change: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Minimum confidence across all months; 0 for an empty projection.
    pub confidence: f64,
}

/// Longest horizon a single request may ask for: fifty years.
pub const MAX_PROJECTION_MONTHS: usize = 600;

pub fn project_balances(request: &ProjectionRequest, config: &ProjectionConfig) -> ProjectionOutcome {
    let requested = request.months.unwrap_or(config.default_months);
    let months = requested.min(MAX_PROJECTION_MONTHS);
    if months < requested {
        warn!(
            "Requested {} months exceeds the {} month horizon, truncating",
            requested, MAX_PROJECTION_MONTHS
        );
    }

    match try_project(request, months) {
        Ok(projections) => {
            debug!("Projected {} months from balance {}", projections.len(), request.current_balance);
            ProjectionOutcome::Projected(projections)
        }
        Err(e) => {
            warn!("Balance projection failed, using flat fallback: {}", e);
            ProjectionOutcome::Fallback {
                projections: fallback_projections(request, months, config.fallback_confidence),
                reason: e.to_string(),
            }
        }
    }
}

fn try_project(request: &ProjectionRequest, months: usize) -> Result<Vec<BalanceProjection>> {
    if !request.current_balance.is_finite() {
        return Err(AnalyticsError::InvalidBalance(request.current_balance));
    }
    for (index, point) in request.income_forecasts.iter().enumerate() {
        point.validate(index)?;
    }
    for (index, point) in request.expense_forecasts.iter().enumerate() {
        point.validate(index)?;
    }

    let zero = ForecastPoint::default();
    let mut running_balance = request.current_balance;
    let mut projections = Vec::with_capacity(months);

    for i in 0..months {
        let income = request.income_forecasts.get(i).unwrap_or(&zero);
        let expense = request.expense_forecasts.get(i).unwrap_or(&zero);

        let net_cash_flow = income.predicted_amount - expense.predicted_amount;
        let previous_balance = running_balance;
        running_balance += net_cash_flow;

        let month = month_number(i);
        projections.push(BalanceProjection {
            month,
            period: period_label(request, income, expense, month),
            projected_balance: round2(running_balance),
            net_cash_flow: round2(net_cash_flow),
            income: round2(income.predicted_amount),
            expenses: round2(expense.predicted_amount),
            confidence: income.confidence.min(expense.confidence),
            balance_change: round2(running_balance - previous_balance),
            is_fallback: false,
        });
    }

    Ok(projections)
}

fn fallback_projections(request: &ProjectionRequest, months: usize, confidence: f64) -> Vec<BalanceProjection> {
    let balance = if request.current_balance.is_finite() {
        round2(request.current_balance)
    } else {
        0.0
    };
    let zero = ForecastPoint::default();

    (0..months)
        .map(|i| {
            let month = month_number(i);
            BalanceProjection {
                month,
                period: period_label(request, &zero, &zero, month),
                projected_balance: balance,
                net_cash_flow: 0.0,
                income: 0.0,
                expenses: 0.0,
                confidence,
                balance_change: 0.0,
                is_fallback: true,
            }
        })
        .collect()
}

fn month_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn period_label(request: &ProjectionRequest, income: &ForecastPoint, expense: &ForecastPoint, month: u32) -> String {
    income
        .period
        .clone()
        .or_else(|| expense.period.clone())
        .or_else(|| request.start_date.map(|start| month_label_after(start, month)))
        .unwrap_or_else(|| format!("Month {}", month))
}

pub fn summarize(starting_balance: f64, projections: &[BalanceProjection]) -> ProjectionSummary {
    let lowest = projections.iter().min_by(|a, b| {
        a.projected_balance
            .partial_cmp(&b.projected_balance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let final_balance = projections
        .last()
        .map(|p| p.projected_balance)
        .unwrap_or(starting_balance);
    let confidence = projections
        .iter()
        .map(|p| p.confidence)
        .reduce(f64::min)
        .unwrap_or(0.0);

    ProjectionSummary {
        starting_balance: round2(starting_balance),
        final_balance: round2(final_balance),
        lowest_balance: lowest
            .map(|p| p.projected_balance)
            .unwrap_or(round2(starting_balance)),
        lowest_balance_month: lowest.map(|p| p.month),
        total_change: round2(final_balance - starting_balance),
        total_income: round2(projections.iter().map(|p| p.income).sum()),
        total_expenses: round2(projections.iter().map(|p| p.expenses).sum()),
        confidence,
    }
}

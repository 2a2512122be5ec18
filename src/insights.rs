//! Rule-based observations comparing the current period against an optional previous one.

use crate::aggregator::{CategoryBreakdown, IncomeVsExpenses};
use crate::config::InsightThresholds;
use crate::utils::{format_money, percent_change, round1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    PositiveBalance,
    NegativeBalance,
    TopCategory,
    IncomeChange,
    ExpenseChange,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::PositiveBalance => "positive_balance",
            InsightType::NegativeBalance => "negative_balance",
            InsightType::TopCategory => "top_category",
            InsightType::IncomeChange => "income_change",
            InsightType::ExpenseChange => "expense_change",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub message: String,
    pub severity: Severity,
    pub actionable: bool,
    pub recommendation: Option<String>,
    pub category: Option<String>,
}

impl Insight {
    fn new(insight_type: InsightType, severity: Severity, message: String) -> Self {
        Self {
            id: insight_type.as_str().to_string(),
            insight_type,
            message,
            severity,
            actionable: false,
            recommendation: None,
            category: None,
        }
    }

    fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.actionable = true;
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// The two aggregates the rules look at for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSnapshot {
    pub summary: IncomeVsExpenses,
    pub breakdown: CategoryBreakdown,
}

pub struct InsightGenerator {
    thresholds: InsightThresholds,
}

impl InsightGenerator {
    pub fn new(thresholds: InsightThresholds) -> Self {
        Self { thresholds }
    }

    /// Emits insights in rule order: net balance, top category, income
    /// change, expense change. The order is part of the contract; callers
    /// that want severity ordering sort themselves.
    pub fn generate(&self, current: &PeriodSnapshot, previous: Option<&PeriodSnapshot>) -> Vec<Insight> {
        let mut insights = Vec::new();

        insights.extend(self.net_balance_insight(&current.summary));
        insights.extend(self.top_category_insight(&current.breakdown));

        if let Some(previous) = previous {
            insights.extend(self.income_change_insight(&current.summary, &previous.summary));
            insights.extend(self.expense_change_insight(&current.summary, &previous.summary));
        }

        insights
    }

    fn net_balance_insight(&self, summary: &IncomeVsExpenses) -> Option<Insight> {
        let net = summary.net_balance;
        if net > 0.0 {
            Some(Insight::new(
                InsightType::PositiveBalance,
                Severity::Low,
                format!("You saved {} this period.", format_money(net)),
            ))
        } else if net < 0.0 {
            Some(
                Insight::new(
                    InsightType::NegativeBalance,
                    Severity::High,
                    format!(
                        "You spent {} more than you earned this period.",
                        format_money(net.abs())
                    ),
                )
                .with_recommendation(
                    "Review your recent expenses and look for costs you can reduce or postpone.",
                ),
            )
        } else {
            None
        }
    }

    fn top_category_insight(&self, breakdown: &CategoryBreakdown) -> Option<Insight> {
        let top = breakdown.top_category()?;
        let share = breakdown.top_category_share().unwrap_or(top.percentage);
        let dominant = share > self.thresholds.dominant_category_share;

        let mut insight = Insight::new(
            InsightType::TopCategory,
            if dominant { Severity::Medium } else { Severity::Low },
            format!(
                "Your top spending category is {} at {} ({}% of expenses).",
                top.name,
                format_money(top.amount),
                round1(share)
            ),
        );
        insight.category = Some(top.name.clone());

        if dominant {
            insight = insight.with_recommendation(format!(
                "{} takes a large share of your spending. Consider setting a budget for it.",
                top.name
            ));
        }

        Some(insight)
    }

    fn income_change_insight(&self, current: &IncomeVsExpenses, previous: &IncomeVsExpenses) -> Option<Insight> {
        let change = percent_change(current.total_income, previous.total_income);
        if change.abs() <= self.thresholds.income_change {
            return None;
        }

        let direction = if change > 0.0 { "increased" } else { "decreased" };
        Some(Insight::new(
            InsightType::IncomeChange,
            self.change_severity(change),
            format!(
                "Your income {} by {}% compared to the previous period.",
                direction,
                round1(change.abs())
            ),
        ))
    }

    fn expense_change_insight(&self, current: &IncomeVsExpenses, previous: &IncomeVsExpenses) -> Option<Insight> {
        let change = percent_change(current.total_expenses, previous.total_expenses);
        if change.abs() <= self.thresholds.expense_change {
            return None;
        }

        if change > 0.0 {
            Some(
                Insight::new(
                    InsightType::ExpenseChange,
                    self.change_severity(change),
                    format!(
                        "Your expenses increased by {}% compared to the previous period.",
                        round1(change)
                    ),
                )
                .with_recommendation(
                    "Check which categories grew the most and whether those purchases were planned.",
                ),
            )
        } else {
            Some(Insight::new(
                InsightType::ExpenseChange,
                self.change_severity(change),
                format!(
                    "Your expenses decreased by {}% compared to the previous period.",
                    round1(change.abs())
                ),
            ))
        }
    }

    fn change_severity(&self, change: f64) -> Severity {
        if change.abs() > self.thresholds.high_severity_change {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new(InsightThresholds::default())
    }
}

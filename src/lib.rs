//! # Cashflow Analytics
//!
//! The analytics and forecasting core of a personal finance tracker: turns a
//! raw list of transactions into period aggregates and insights, and turns
//! externally forecast income/expense figures into multi-month balance
//! projections with risk detection and what-if scenarios.
//!
//! ## Core Concepts
//!
//! - **Aggregates**: category breakdown, income vs expenses, cost of living and
//!   monthly trends, each a pure function of (transactions, period)
//! - **Result Cache**: TTL-bounded memoization owned by an [`AnalyticsEngine`];
//!   the transaction store owner calls
//!   [`AnalyticsEngine::on_transaction_data_changed`] after every mutation
//! - **Insights**: rule-based observations comparing two periods
//! - **Projections**: a fold of forecast points over a starting balance, with a
//!   typed fallback when the forecast inputs are unusable
//! - **Weakest-link confidence**: combined confidence is always the minimum
//!
//! Read paths never fail. Degenerate input yields empty or zero results, and a
//! projection that could not be computed comes back as
//! [`ProjectionOutcome::Fallback`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use cashflow_analytics::*;
//! use chrono::NaiveDate;
//!
//! let transactions = vec![
//!     Transaction::new("t1", TransactionType::Income, 3200.0).with_date("2024-03-01"),
//!     Transaction::new("t2", TransactionType::Expense, 1200.0)
//!         .with_category("Rent")
//!         .with_date("2024-03-02"),
//! ];
//! let march = TimePeriod::new(
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//! );
//!
//! let mut engine = AnalyticsEngine::default();
//! let summary = engine.income_vs_expenses(&transactions, Some(&march));
//! let insights = engine.generate_insights(&transactions, Some(&march), None);
//!
//! let predictor = BalancePredictor::default();
//! let report = predictor.forecast(
//!     &ProjectionRequest::new(
//!         summary.net_balance,
//!         vec![ForecastPoint::new(3200.0, 0.9)],
//!         vec![ForecastPoint::new(2900.0, 0.75)],
//!     ),
//!     Some(5000.0),
//! );
//! ```

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod config;
pub mod consolidation;
pub mod engine;
pub mod error;
pub mod filter;
pub mod insights;
pub mod predictor;
pub mod projector;
pub mod risk;
pub mod scenario;
pub mod schema;
pub mod utils;

pub use aggregator::{
    AggregateResult, CategoryBreakdown, CategoryBucket, CostOfLiving, IncomeVsExpenses,
    MonthlyTrend, UNCATEGORIZED,
};
pub use cache::{CacheEntry, CacheStats, ResultCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnalyticsConfig, CacheConfig, InsightThresholds, ProjectionConfig, RiskThresholds};
pub use consolidation::consolidate;
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use filter::filter_by_period;
pub use insights::{Insight, InsightGenerator, InsightType, PeriodSnapshot, Severity};
pub use predictor::{BalanceForecastReport, BalancePredictor};
pub use projector::{
    project_balances, summarize, BalanceProjection, ProjectionOutcome, ProjectionRequest,
    ProjectionSummary,
};
pub use risk::{detect_credit_utilization, detect_low_balance, detect_overdraft, RiskKind, RiskLevel, RiskWarning};
pub use scenario::{apply_scenario, compare_scenario, ScenarioComparison};
pub use schema::{ForecastPoint, ScenarioAdjustment, TimePeriod, Transaction, TransactionType};

/// JSON Schema for the transaction records this crate accepts.
pub fn transaction_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Transaction)
}

use crate::aggregator::{self, AggregateResult, CategoryBreakdown, CostOfLiving, IncomeVsExpenses, MonthlyTrend};
use crate::cache::{CacheStats, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{AnalyticsConfig, InsightThresholds};
use crate::filter::filter_by_period;
use crate::insights::{Insight, InsightGenerator, PeriodSnapshot};
use crate::schema::{TimePeriod, Transaction};
use log::{debug, info};
use std::sync::Arc;

const CATEGORY_BREAKDOWN: &str = "category_breakdown";
const INCOME_VS_EXPENSES: &str = "income_vs_expenses";
const COST_OF_LIVING: &str = "cost_of_living";
const MONTHLY_TRENDS: &str = "monthly_trends";

const CACHED_FAMILIES: [&str; 4] = [
    CATEGORY_BREAKDOWN,
    INCOME_VS_EXPENSES,
    COST_OF_LIVING,
    MONTHLY_TRENDS,
];

/// Period aggregates behind an owned result cache, plus insight generation.
///
/// Cache keys are built from the computation name and the period only, so
/// whoever mutates the transaction store must call
/// [`AnalyticsEngine::on_transaction_data_changed`] afterwards.
pub struct AnalyticsEngine {
    cache: ResultCache,
    insights: InsightGenerator,
}

impl AnalyticsEngine {
    pub fn new(cache: ResultCache, thresholds: InsightThresholds) -> Self {
        Self {
            cache,
            insights: InsightGenerator::new(thresholds),
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AnalyticsConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            ResultCache::new(&config.cache, clock),
            config.insights.clone(),
        )
    }

    pub fn category_breakdown(&mut self, transactions: &[Transaction], period: Option<&TimePeriod>) -> CategoryBreakdown {
        let key = cache_key(CATEGORY_BREAKDOWN, period);
        if let Some(AggregateResult::CategoryBreakdown(hit)) = self.cache.get(&key) {
            return hit;
        }

        let result = aggregator::category_breakdown(&filter_by_period(transactions, period));
        self.cache
            .set(key, AggregateResult::CategoryBreakdown(result.clone()));
        result
    }

    pub fn income_vs_expenses(&mut self, transactions: &[Transaction], period: Option<&TimePeriod>) -> IncomeVsExpenses {
        let key = cache_key(INCOME_VS_EXPENSES, period);
        if let Some(AggregateResult::IncomeVsExpenses(hit)) = self.cache.get(&key) {
            return hit;
        }

        let result = aggregator::income_vs_expenses(&filter_by_period(transactions, period));
        self.cache
            .set(key, AggregateResult::IncomeVsExpenses(result.clone()));
        result
    }

    pub fn cost_of_living(&mut self, transactions: &[Transaction], period: Option<&TimePeriod>) -> CostOfLiving {
        let key = cache_key(COST_OF_LIVING, period);
        if let Some(AggregateResult::CostOfLiving(hit)) = self.cache.get(&key) {
            return hit;
        }

        let breakdown = self.category_breakdown(transactions, period);
        let summary = self.income_vs_expenses(transactions, period);
        let result = aggregator::cost_of_living(&breakdown, &summary, period);
        self.cache
            .set(key, AggregateResult::CostOfLiving(result.clone()));
        result
    }

    pub fn monthly_trends(&mut self, transactions: &[Transaction], period: Option<&TimePeriod>) -> Vec<MonthlyTrend> {
        let key = cache_key(MONTHLY_TRENDS, period);
        if let Some(AggregateResult::MonthlyTrends { months }) = self.cache.get(&key) {
            return months;
        }

        let months = aggregator::monthly_trends(&filter_by_period(transactions, period));
        self.cache.set(
            key,
            AggregateResult::MonthlyTrends {
                months: months.clone(),
            },
        );
        months
    }

    /// Insights for `current`, with period-over-period rules when `previous` is given.
    pub fn generate_insights(
        &mut self,
        transactions: &[Transaction],
        current: Option<&TimePeriod>,
        previous: Option<&TimePeriod>,
    ) -> Vec<Insight> {
        let current_snapshot = self.snapshot(transactions, current);
        let previous_snapshot = previous.map(|p| self.snapshot(transactions, Some(p)));

        let insights = self
            .insights
            .generate(&current_snapshot, previous_snapshot.as_ref());
        debug!("Generated {} insights", insights.len());
        insights
    }

    /// Drops every cached aggregate family. Call after any create, update or
    /// delete in the transaction store.
    pub fn on_transaction_data_changed(&mut self) {
        let removed: usize = CACHED_FAMILIES
            .iter()
            .map(|family| self.cache.invalidate(family))
            .sum();
        info!("Transaction data changed, dropped {} cached aggregates", removed);
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn snapshot(&mut self, transactions: &[Transaction], period: Option<&TimePeriod>) -> PeriodSnapshot {
        PeriodSnapshot {
            summary: self.income_vs_expenses(transactions, period),
            breakdown: self.category_breakdown(transactions, period),
        }
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

fn cache_key(name: &str, period: Option<&TimePeriod>) -> String {
    let serialized = serde_json::to_string(&period).unwrap_or_else(|_| "null".to_string());
    format!("{}:{}", name, serialized)
}

//! Pure aggregate computations over an already-filtered transaction list.

use crate::schema::{TimePeriod, Transaction, TransactionType};
use crate::utils::{
    month_label, parse_transaction_datetime, percentage, round2, safe_average,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Days assumed for a period without both bounds.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryBucket {
    pub name: String,
    pub amount: f64,
    pub transaction_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryBreakdown {
    /// Sorted by amount, largest first.
    pub categories: Vec<CategoryBucket>,
    pub total_expenses: f64,
    pub transaction_count: usize,
}

impl CategoryBreakdown {
    pub fn top_category(&self) -> Option<&CategoryBucket> {
        self.categories.first()
    }

    /// Share of the top category in total expenses, before the two-decimal
    /// rounding applied to `CategoryBucket::percentage`.
    pub fn top_category_share(&self) -> Option<f64> {
        self.top_category()
            .map(|top| percentage(top.amount, self.total_expenses))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IncomeVsExpenses {
    pub total_income: f64,
    /// Expenses net of refunds, never below zero.
    pub total_expenses: f64,
    pub net_balance: f64,
    pub income_count: usize,
    pub expense_count: usize,
    pub average_income: f64,
    pub average_expense: f64,
    pub total_refunds: f64,
    /// Amount by which refunds exceeded expenses; zero unless the clamp kicked in.
    pub net_refund_credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostOfLiving {
    pub period_days: i64,
    pub total_expenses: f64,
    pub total_income: f64,
    pub daily_spending: f64,
    pub monthly_spending: f64,
    pub daily_income: f64,
    pub monthly_income: f64,
    pub top_category: Option<String>,
    pub top_category_amount: f64,
    /// Expenses as a percent of income; 0 without income.
    pub spending_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyTrend {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub transaction_count: usize,
}

/// Every aggregate the engine knows how to cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateResult {
    CategoryBreakdown(CategoryBreakdown),
    IncomeVsExpenses(IncomeVsExpenses),
    CostOfLiving(CostOfLiving),
    MonthlyTrends { months: Vec<MonthlyTrend> },
}

/// How a transaction moves the income/expense totals.
enum Effect {
    Income,
    Expense,
    Refund,
    Ignored,
}

fn effect_of(kind: TransactionType) -> Effect {
    match kind {
        TransactionType::Income => Effect::Income,
        TransactionType::Expense => Effect::Expense,
        TransactionType::Refund => Effect::Refund,
        TransactionType::Transfer => Effect::Ignored,
        // Unknown-type policy: anything unrecognized is counted as an expense.
        TransactionType::Unknown => Effect::Expense,
    }
}

#[derive(Default)]
struct FlowTotals {
    income: f64,
    expenses: f64,
    refunds: f64,
    income_count: usize,
    expense_count: usize,
}

impl FlowTotals {
    fn add(&mut self, tx: &Transaction) {
        let amount = tx.magnitude();
        match effect_of(tx.kind) {
            Effect::Income => {
                self.income += amount;
                self.income_count += 1;
            }
            Effect::Expense => {
                self.expenses += amount;
                self.expense_count += 1;
            }
            Effect::Refund => {
                self.expenses -= amount;
                self.refunds += amount;
            }
            Effect::Ignored => {}
        }
    }

    fn clamped_expenses(&self) -> f64 {
        self.expenses.max(0.0)
    }
}

pub fn category_breakdown(transactions: &[Transaction]) -> CategoryBreakdown {
    let mut buckets: Vec<CategoryBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut total = 0.0;
    let mut count = 0;

    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense)
    {
        let name = tx
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        let amount = tx.magnitude();

        let slot = *index.entry(name.to_string()).or_insert_with(|| {
            buckets.push(CategoryBucket {
                name: name.to_string(),
                amount: 0.0,
                transaction_count: 0,
                percentage: 0.0,
            });
            buckets.len() - 1
        });

        buckets[slot].amount += amount;
        buckets[slot].transaction_count += 1;
        total += amount;
        count += 1;
    }

    for bucket in &mut buckets {
        bucket.percentage = round2(percentage(bucket.amount, total));
        bucket.amount = round2(bucket.amount);
    }

    // Stable sort keeps first-seen order among equal amounts.
    buckets.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    CategoryBreakdown {
        categories: buckets,
        total_expenses: round2(total),
        transaction_count: count,
    }
}

pub fn income_vs_expenses(transactions: &[Transaction]) -> IncomeVsExpenses {
    let mut totals = FlowTotals::default();
    for tx in transactions {
        totals.add(tx);
    }

    let expenses = totals.clamped_expenses();
    let net_refund_credit = if totals.expenses < 0.0 {
        -totals.expenses
    } else {
        0.0
    };

    IncomeVsExpenses {
        total_income: round2(totals.income),
        total_expenses: round2(expenses),
        net_balance: round2(totals.income - expenses),
        income_count: totals.income_count,
        expense_count: totals.expense_count,
        average_income: round2(safe_average(totals.income, totals.income_count)),
        average_expense: round2(safe_average(expenses, totals.expense_count)),
        total_refunds: round2(totals.refunds),
        net_refund_credit: round2(net_refund_credit),
    }
}

pub fn cost_of_living(
    breakdown: &CategoryBreakdown,
    summary: &IncomeVsExpenses,
    period: Option<&TimePeriod>,
) -> CostOfLiving {
    let period_days = period
        .and_then(TimePeriod::duration_days)
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_PERIOD_DAYS);
    let days = period_days as f64;

    let daily_spending = summary.total_expenses / days;
    let daily_income = summary.total_income / days;
    let top = breakdown.top_category();

    CostOfLiving {
        period_days,
        total_expenses: summary.total_expenses,
        total_income: summary.total_income,
        daily_spending: round2(daily_spending),
        monthly_spending: round2(daily_spending * 30.0),
        daily_income: round2(daily_income),
        monthly_income: round2(daily_income * 30.0),
        top_category: top.map(|c| c.name.clone()),
        top_category_amount: top.map(|c| c.amount).unwrap_or(0.0),
        spending_rate: round2(percentage(summary.total_expenses, summary.total_income)),
    }
}

/// Income and expenses per calendar month. Undated transactions are skipped.
pub fn monthly_trends(transactions: &[Transaction]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, (FlowTotals, usize)> = BTreeMap::new();

    for tx in transactions {
        let Some(dt) = tx.raw_date().and_then(parse_transaction_datetime) else {
            continue;
        };
        let entry = months.entry(month_label(dt.date())).or_default();
        entry.0.add(tx);
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (totals, count))| {
            let expenses = totals.clamped_expenses();
            MonthlyTrend {
                month,
                income: round2(totals.income),
                expenses: round2(expenses),
                net: round2(totals.income - expenses),
                transaction_count: count,
            }
        })
        .collect()
}

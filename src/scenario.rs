use crate::projector::BalanceProjection;
use crate::schema::ScenarioAdjustment;
use crate::utils::round2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioComparison {
    pub baseline_final_balance: f64,
    pub scenario_final_balance: f64,
    pub difference: f64,
    pub projections: Vec<BalanceProjection>,
}

/// Re-derives `baseline` under `adjustment`, returning a new sequence.
///
/// Recurring changes apply to every month `>= start_month`; one-time amounts
/// land in the first projected month. The first month's balance is corrected
/// in place (baseline balance minus its original net flow plus the adjusted
/// one); every later month carries the adjusted running balance forward
/// rather than reusing baseline balances.
pub fn apply_scenario(baseline: &[BalanceProjection], adjustment: &ScenarioAdjustment) -> Vec<BalanceProjection> {
    let mut adjusted = Vec::with_capacity(baseline.len());
    let mut running_balance = 0.0;

    for (i, original) in baseline.iter().enumerate() {
        let recurring = original.month >= adjustment.start_month;

        let mut income = original.income;
        let mut expenses = original.expenses;
        if recurring {
            income += adjustment.income_change;
            expenses += adjustment.expense_change;
        }
        if i == 0 {
            income += adjustment.one_time_income;
            expenses += adjustment.one_time_expense;
        }

        let net_cash_flow = income - expenses;
        let previous_balance = if i == 0 {
            original.projected_balance - original.net_cash_flow
        } else {
            running_balance
        };
        running_balance = previous_balance + net_cash_flow;

        adjusted.push(BalanceProjection {
            month: original.month,
            period: original.period.clone(),
            projected_balance: round2(running_balance),
            net_cash_flow: round2(net_cash_flow),
            income: round2(income),
            expenses: round2(expenses),
            confidence: original.confidence,
            balance_change: round2(running_balance - previous_balance),
            is_fallback: original.is_fallback,
        });
    }

    adjusted
}

pub fn compare_scenario(baseline: &[BalanceProjection], adjustment: &ScenarioAdjustment) -> ScenarioComparison {
    let projections = apply_scenario(baseline, adjustment);
    let baseline_final_balance = baseline.last().map(|p| p.projected_balance).unwrap_or(0.0);
    let scenario_final_balance = projections
        .last()
        .map(|p| p.projected_balance)
        .unwrap_or(0.0);

    ScenarioComparison {
        baseline_final_balance,
        scenario_final_balance,
        difference: round2(scenario_final_balance - baseline_final_balance),
        projections,
    }
}

use crate::projector::BalanceProjection;
use crate::utils::round2;

/// Sums per-account projections month by month.
///
/// Sequences may differ in length: the result runs to the longest one and an
/// account simply contributes nothing to months it lacks. Confidence for a
/// month is the lowest among the accounts that have that month.
pub fn consolidate(accounts: &[Vec<BalanceProjection>]) -> Vec<BalanceProjection> {
    let longest = accounts.iter().map(Vec::len).max().unwrap_or(0);
    let mut consolidated = Vec::with_capacity(longest);

    for index in 0..longest {
        let mut present = accounts.iter().filter_map(|account| account.get(index)).peekable();
        let Some(first) = present.peek().copied() else {
            continue;
        };

        let mut total = BalanceProjection {
            month: first.month,
            period: first.period.clone(),
            projected_balance: 0.0,
            net_cash_flow: 0.0,
            income: 0.0,
            expenses: 0.0,
            confidence: f64::INFINITY,
            balance_change: 0.0,
            is_fallback: false,
        };

        for projection in present {
            total.projected_balance += projection.projected_balance;
            total.net_cash_flow += projection.net_cash_flow;
            total.income += projection.income;
            total.expenses += projection.expenses;
            total.balance_change += projection.balance_change;
            total.confidence = total.confidence.min(projection.confidence);
            total.is_fallback |= projection.is_fallback;
        }

        total.projected_balance = round2(total.projected_balance);
        total.net_cash_flow = round2(total.net_cash_flow);
        total.income = round2(total.income);
        total.expenses = round2(total.expenses);
        total.balance_change = round2(total.balance_change);
        consolidated.push(total);
    }

    consolidated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balances: &[(f64, f64)]) -> Vec<BalanceProjection> {
        balances
            .iter()
            .enumerate()
            .map(|(i, (balance, confidence))| BalanceProjection {
                month: i as u32 + 1,
                period: format!("Month {}", i + 1),
                projected_balance: *balance,
                net_cash_flow: 10.0,
                income: 110.0,
                expenses: 100.0,
                confidence: *confidence,
                balance_change: 10.0,
                is_fallback: false,
            })
            .collect()
    }

    #[test]
    fn test_sums_matching_months_with_weakest_confidence() {
        let checking = account(&[(1000.0, 0.9), (1010.0, 0.85)]);
        let savings = account(&[(5000.0, 0.6), (5010.0, 0.95)]);

        let total = consolidate(&[checking, savings]);
        assert_eq!(total.len(), 2);
        assert_eq!(total[0].projected_balance, 6000.0);
        assert_eq!(total[0].income, 220.0);
        assert_eq!(total[0].net_cash_flow, 20.0);
        assert_eq!(total[0].confidence, 0.6);
        assert_eq!(total[1].projected_balance, 6020.0);
        assert_eq!(total[1].confidence, 0.85);
    }

    #[test]
    fn test_unequal_lengths_run_to_longest() {
        let short = account(&[(100.0, 0.5)]);
        let long = account(&[(200.0, 0.9), (300.0, 0.8), (400.0, 0.7)]);

        let total = consolidate(&[short, long]);
        assert_eq!(total.len(), 3);
        assert_eq!(total[0].projected_balance, 300.0);
        assert_eq!(total[0].confidence, 0.5);
        assert_eq!(total[1].projected_balance, 300.0);
        assert_eq!(total[1].confidence, 0.8);
        assert_eq!(total[2].month, 3);
        assert_eq!(total[2].expenses, 100.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(consolidate(&[]).is_empty());
        assert!(consolidate(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_fallback_marker_propagates() {
        let real = account(&[(100.0, 0.5)]);
        let mut fallback = account(&[(50.0, 0.1)]);
        fallback[0].is_fallback = true;

        let total = consolidate(&[real, fallback]);
        assert!(total[0].is_fallback);
    }
}

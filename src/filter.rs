use crate::schema::{TimePeriod, Transaction};
use crate::utils::{end_of_day, parse_transaction_datetime, start_of_day};

/// Restricts `transactions` to those dated inside `period`, keeping their order.
///
/// A missing or half-open period returns the input unchanged. Transactions
/// whose date cannot be parsed are dropped.
pub fn filter_by_period(transactions: &[Transaction], period: Option<&TimePeriod>) -> Vec<Transaction> {
    let Some((start, end)) = period.and_then(TimePeriod::bounds) else {
        return transactions.to_vec();
    };

    let window_start = start_of_day(start);
    let window_end = end_of_day(end);

    transactions
        .iter()
        .filter(|tx| {
            tx.raw_date()
                .and_then(parse_transaction_datetime)
                .map(|dt| dt >= window_start && dt <= window_end)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

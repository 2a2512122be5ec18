use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[schemars(description = "Money leaving the account for goods or services")]
    Expense,

    #[schemars(description = "Money entering the account (salary, interest, gifts)")]
    Income,

    #[schemars(description = "Movement between the user's own accounts. Excluded from all totals.")]
    Transfer,

    #[schemars(description = "Money returned for an earlier expense. Offsets expenses.")]
    Refund,

    /// Any type string the store produced that this crate does not recognize.
    #[serde(other)]
    Unknown,
}

/// A transaction as handed over by the transaction store.
///
/// `amount` is a non-negative magnitude at rest; the effect on totals comes
/// from `kind`. Every optional field may be missing without breaking any
/// aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Transaction {
    pub id: String,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub account_id: Option<String>,

    #[schemars(
        description = "Transaction date. RFC 3339, 'YYYY-MM-DDTHH:MM:SS', 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'."
    )]
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<String>,

    #[schemars(
        description = "Creation timestamp, used only when `date` is absent. Same formats as `date`, or epoch milliseconds as a number or string."
    )]
    #[serde(default, deserialize_with = "lenient_date")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Reads a date field as text, turning a numeric epoch-milliseconds value
/// into its digit string. Any other JSON shape reads as "no date".
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Millis(i64),
        Other(serde_json::Value),
    }

    Ok(match Option::<RawDate>::deserialize(deserializer)? {
        Some(RawDate::Text(text)) => Some(text),
        Some(RawDate::Millis(millis)) => Some(millis.to_string()),
        Some(RawDate::Other(_)) | None => None,
    })
}

impl Transaction {
    pub fn new(id: impl Into<String>, kind: TransactionType, amount: f64) -> Self {
        Self {
            id: id.into(),
            amount: Some(amount),
            kind,
            category: None,
            account_id: None,
            date: None,
            timestamp: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Absolute amount, with a missing or non-finite amount counting as zero.
    pub fn magnitude(&self) -> f64 {
        self.amount
            .filter(|a| a.is_finite())
            .map(f64::abs)
            .unwrap_or(0.0)
    }

    /// The raw date string used for filtering: `date`, falling back to
    /// `timestamp` only when `date` is absent or empty.
    pub fn raw_date(&self) -> Option<&str> {
        match self.date.as_deref() {
            Some(d) if !d.trim().is_empty() => Some(d),
            _ => self.timestamp.as_deref(),
        }
    }
}

/// Inclusive date window. A period missing either bound is treated as "no filter".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
pub struct TimePeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TimePeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Number of calendar days covered, counting both endpoints.
    pub fn duration_days(&self) -> Option<i64> {
        self.bounds().map(|(start, end)| (end - start).num_days() + 1)
    }
}

/// Externally supplied prediction for one future month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct ForecastPoint {
    #[schemars(description = "Label of the forecast month, e.g. '2024-03'. Optional.")]
    #[serde(default)]
    pub period: Option<String>,

    #[schemars(description = "Predicted income or expense total for the month")]
    pub predicted_amount: f64,

    #[schemars(description = "Confidence of the prediction, between 0.0 and 1.0")]
    pub confidence: f64,
}

impl ForecastPoint {
    pub fn new(predicted_amount: f64, confidence: f64) -> Self {
        Self {
            period: None,
            predicted_amount,
            confidence,
        }
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.predicted_amount.is_finite() {
            return Err(AnalyticsError::InvalidForecastPoint {
                index,
                details: format!("predicted amount {} is not finite", self.predicted_amount),
            });
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AnalyticsError::InvalidForecastPoint {
                index,
                details: format!("confidence {} is outside [0, 1]", self.confidence),
            });
        }

        Ok(())
    }
}

/// What-if deltas applied on top of a baseline projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ScenarioAdjustment {
    #[schemars(description = "Recurring monthly change to income, applied from `start_month` on")]
    pub income_change: f64,

    #[schemars(description = "Recurring monthly change to expenses, applied from `start_month` on")]
    pub expense_change: f64,

    #[schemars(description = "Extra income received once, in the first projected month")]
    pub one_time_income: f64,

    #[schemars(description = "Extra expense paid once, in the first projected month")]
    pub one_time_expense: f64,

    #[schemars(description = "First month (1-based) the recurring changes apply to")]
    pub start_month: u32,
}

impl Default for ScenarioAdjustment {
    fn default() -> Self {
        Self {
            income_change: 0.0,
            expense_change: 0.0,
            one_time_income: 0.0,
            one_time_expense: 0.0,
            start_month: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_deserializes() {
        let json = r#"{"id":"t1","amount":12.5,"type":"fee","category":null}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, TransactionType::Unknown);
        assert_eq!(tx.category, None);
        assert!(tx.date.is_none());
    }

    #[test]
    fn test_null_amount_is_zero_magnitude() {
        let json = r#"{"id":"t1","amount":null,"type":"expense"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.magnitude(), 0.0);

        let negative = Transaction::new("t2", TransactionType::Expense, -40.0);
        assert_eq!(negative.magnitude(), 40.0);
    }

    #[test]
    fn test_numeric_timestamp_reads_as_epoch_millis() {
        let json = r#"[
            {"id":"1","amount":10.0,"type":"expense","timestamp":1710460800000},
            {"id":"2","amount":5.0,"type":"expense","date":"2024-03-15","timestamp":"1710460800000"},
            {"id":"3","amount":1.0,"type":"expense","date":true,"timestamp":{"seconds":1}}
        ]"#;
        let txs: Vec<Transaction> = serde_json::from_str(json).unwrap();

        assert_eq!(txs[0].timestamp.as_deref(), Some("1710460800000"));
        assert_eq!(txs[0].raw_date(), Some("1710460800000"));
        assert_eq!(txs[1].timestamp.as_deref(), Some("1710460800000"));
        assert!(txs[2].date.is_none());
        assert!(txs[2].timestamp.is_none());
    }

    #[test]
    fn test_raw_date_falls_back_to_timestamp() {
        let mut tx = Transaction::new("t1", TransactionType::Income, 10.0);
        tx.timestamp = Some("2024-01-05".to_string());
        assert_eq!(tx.raw_date(), Some("2024-01-05"));

        tx.date = Some("2024-02-01".to_string());
        assert_eq!(tx.raw_date(), Some("2024-02-01"));

        tx.date = Some("  ".to_string());
        assert_eq!(tx.raw_date(), Some("2024-01-05"));
    }

    #[test]
    fn test_period_duration_is_inclusive() {
        let period = TimePeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert_eq!(period.duration_days(), Some(31));

        let open = TimePeriod {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
        };
        assert_eq!(open.bounds(), None);
        assert_eq!(open.duration_days(), None);
    }

    #[test]
    fn test_forecast_point_validation() {
        assert!(ForecastPoint::new(100.0, 0.5).validate(0).is_ok());
        assert!(ForecastPoint::new(100.0, 1.0).validate(0).is_ok());
        assert!(ForecastPoint::new(f64::NAN, 0.5).validate(0).is_err());
        assert!(ForecastPoint::new(100.0, 1.2).validate(3).is_err());
        assert!(ForecastPoint::new(100.0, -0.1).validate(3).is_err());
    }

    #[test]
    fn test_scenario_defaults_from_partial_json() {
        let adjustment: ScenarioAdjustment =
            serde_json::from_str(r#"{"income_change": 250.0}"#).unwrap();
        assert_eq!(adjustment.income_change, 250.0);
        assert_eq!(adjustment.start_month, 1);
        assert_eq!(adjustment.one_time_expense, 0.0);
    }
}

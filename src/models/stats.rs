//! Statistics query and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::period::Period;

/// Period used when a statistics request names none.
pub const DEFAULT_STATS_PERIOD: &str = "week";

/// Query string of the `/api/v1/stats/*` endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl StatsQuery {
    /// The requested period name, defaulting to a week.
    pub fn period_name(&self) -> &str {
        self.period
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_STATS_PERIOD)
    }

    pub fn period(&self) -> Period {
        Period::parse(
            Some(self.period_name()),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }
}

/// Expense and income totals over a period. Transfers are not counted.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OverviewResponse {
    pub period: String,
    pub total_expense: Decimal,
    pub total_income: Decimal,
}

#[derive(Debug, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct CategoryTotal {
    pub name: String,
    pub total_expense: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CategoryStatsResponse {
    pub period: String,
    pub categories: Vec<CategoryTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_defaults_to_week() {
        let query = StatsQuery::default();
        assert_eq!(query.period_name(), "week");
        assert_eq!(query.period(), Period::Week);

        let blank = StatsQuery {
            period: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.period_name(), "week");
    }

    #[test]
    fn explicit_period_is_kept() {
        let query = StatsQuery {
            period: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(query.period(), Period::All);
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every HTTP response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

pub mod account {
    use super::*;

    /// Request body for registering or editing an account.
    ///
    /// Every field is required; missing ones are reported by the server as
    /// validation errors.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountNew {
        pub bank: Option<String>,
        pub agency: Option<String>,
        pub account_number: Option<String>,
        pub account_kind: Option<String>,
        pub holder: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub bank: String,
        pub agency: String,
        pub account_number: String,
        pub account_kind: String,
        pub holder: String,
    }
}

pub mod movement {
    use super::*;

    /// Request body for registering or editing a movement.
    ///
    /// Enumerated fields carry their symbolic names (`"INCOME"`,
    /// `"COMPLETED"`, `"SALARY"`, ...).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MovementNew {
        pub account_id: Option<i64>,
        pub kind: Option<String>,
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
        pub category: Option<String>,
        pub movement_date: Option<NaiveDate>,
        /// Defaults to `COMPLETED` on registration, unchanged on edit.
        pub status: Option<String>,
        /// Defaults to `API`.
        pub source: Option<String>,
        pub notes: Option<String>,
        pub origin_file: Option<String>,
        pub external_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub id: i64,
        pub account_id: i64,
        pub kind: String,
        pub amount_minor: i64,
        pub description: String,
        pub category: String,
        pub movement_date: NaiveDate,
        pub registered_at: DateTime<Utc>,
        pub status: String,
        pub source: String,
        pub notes: Option<String>,
        pub prior_balance_minor: i64,
        pub resulting_balance_minor: i64,
        pub origin_file: Option<String>,
        pub external_id: Option<String>,
    }

    /// Optional filters of `GET /movements/account/{id}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MovementListQuery {
        pub kind: Option<String>,
        pub status: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    /// Inclusive date range; both bounds are required where it is used.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PeriodQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub account_id: i64,
        pub balance_minor: i64,
    }

    /// Request body of `POST /movements/import`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ImportRequest {
        pub account_id: Option<i64>,
        pub file_name: Option<String>,
        /// CSV document with header
        /// `date,kind,amount,description,category,external_id`.
        pub content: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImportView {
        pub imported: Vec<MovementView>,
        /// Rows whose external id was already registered.
        pub skipped: usize,
    }
}

pub mod report {
    use super::*;
    use crate::movement::MovementView;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportRequest {
        pub account_id: Option<i64>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub kind: Option<String>,
        pub title: Option<String>,
        pub include_summary: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportAccount {
        pub account_id: i64,
        pub bank: String,
        pub agency: String,
        pub account_number: String,
        pub holder: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportView {
        pub title: String,
        pub account: ReportAccount,
        pub generated_on: NaiveDate,
        pub movements: Vec<MovementView>,
        pub total_income_minor: i64,
        pub total_expense_minor: i64,
        pub net_minor: i64,
        pub current_balance_minor: i64,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub kind: Option<String>,
        pub include_summary: bool,
    }
}

pub mod goal {
    use super::*;

    /// Request body for creating or editing a goal, and for viability checks.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalNew {
        pub account_id: Option<i64>,
        pub name: Option<String>,
        pub description: Option<String>,
        pub kind: Option<String>,
        pub target_minor: Option<i64>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: i64,
        pub account_id: i64,
        pub name: String,
        pub description: Option<String>,
        pub kind: String,
        pub target_minor: i64,
        pub current_minor: i64,
        /// Completion percentage with four fractional digits, e.g. `"30.0000"`.
        pub percentage: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub status: String,
        pub registered_at: DateTime<Utc>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProgressUpdate {
        pub amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SweepView {
        pub expired: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdviceView {
        pub text: String,
        /// `true` when the advisor failed and a fallback text is returned.
        pub degraded: bool,
    }
}

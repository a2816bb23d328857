//! Command structs for engine operations.
//!
//! These types group parameters for write operations (accounts, movements,
//! goals, reports and imports), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;

use crate::{Category, GoalKind, MoneyCents, MovementKind, MovementSource, MovementStatus};

/// Register or edit an account.
#[derive(Clone, Debug)]
pub struct AccountCmd {
    pub bank: String,
    pub agency: String,
    pub account_number: String,
    pub account_kind: String,
    pub holder: String,
}

impl AccountCmd {
    #[must_use]
    pub fn new(
        bank: impl Into<String>,
        agency: impl Into<String>,
        account_number: impl Into<String>,
        account_kind: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        Self {
            bank: bank.into(),
            agency: agency.into(),
            account_number: account_number.into(),
            account_kind: account_kind.into(),
            holder: holder.into(),
        }
    }
}

/// Register or edit a movement.
#[derive(Clone, Debug)]
pub struct MovementCmd {
    pub account_id: i64,
    pub kind: MovementKind,
    pub amount: MoneyCents,
    pub description: String,
    pub category: Category,
    pub movement_date: NaiveDate,
    pub source: MovementSource,
    /// `None` keeps the default (`COMPLETED` on registration, unchanged on
    /// edit).
    pub status: Option<MovementStatus>,
    pub notes: Option<String>,
    pub origin_file: Option<String>,
    pub external_id: Option<String>,
}

impl MovementCmd {
    #[must_use]
    pub fn new(
        account_id: i64,
        kind: MovementKind,
        amount: MoneyCents,
        description: impl Into<String>,
        category: Category,
        movement_date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            kind,
            amount,
            description: description.into(),
            category,
            movement_date,
            source: MovementSource::Manual,
            status: None,
            notes: None,
            origin_file: None,
            external_id: None,
        }
    }

    #[must_use]
    pub fn income(
        account_id: i64,
        amount: MoneyCents,
        description: impl Into<String>,
        category: Category,
        movement_date: NaiveDate,
    ) -> Self {
        Self::new(
            account_id,
            MovementKind::Income,
            amount,
            description,
            category,
            movement_date,
        )
    }

    #[must_use]
    pub fn expense(
        account_id: i64,
        amount: MoneyCents,
        description: impl Into<String>,
        category: Category,
        movement_date: NaiveDate,
    ) -> Self {
        Self::new(
            account_id,
            MovementKind::Expense,
            amount,
            description,
            category,
            movement_date,
        )
    }

    #[must_use]
    pub fn source(mut self, source: MovementSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn status(mut self, status: MovementStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn origin_file(mut self, origin_file: impl Into<String>) -> Self {
        self.origin_file = Some(origin_file.into());
        self
    }

    #[must_use]
    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Filters for account movement listings.
///
/// A period is only applied when both bounds are present.
#[derive(Clone, Debug, Default)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub status: Option<MovementStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MovementFilter {
    #[must_use]
    pub fn kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn status(mut self, status: MovementStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn period(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Both bounds, or `None` for a partial or missing range.
    #[must_use]
    pub fn full_period(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.from.zip(self.to)
    }
}

/// Create or edit a savings goal.
#[derive(Clone, Debug)]
pub struct GoalCmd {
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: GoalKind,
    pub target: MoneyCents,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

impl GoalCmd {
    #[must_use]
    pub fn new(
        account_id: i64,
        name: impl Into<String>,
        kind: GoalKind,
        target: MoneyCents,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            name: name.into(),
            description: None,
            kind,
            target,
            start_date,
            end_date,
            notes: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Parameters of a movement report.
#[derive(Clone, Debug)]
pub struct ReportParams {
    pub account_id: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<MovementKind>,
    pub title: Option<String>,
    pub include_summary: bool,
}

impl ReportParams {
    #[must_use]
    pub fn new(account_id: i64) -> Self {
        Self {
            account_id,
            from: None,
            to: None,
            kind: None,
            title: None,
            include_summary: true,
        }
    }

    #[must_use]
    pub fn period(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn include_summary(mut self, include_summary: bool) -> Self {
        self.include_summary = include_summary;
        self
    }
}

/// Import movements from a CSV document.
///
/// Expected header: `date,kind,amount,description,category,external_id`.
#[derive(Clone, Debug)]
pub struct ImportCmd {
    pub account_id: i64,
    pub file_name: String,
    pub content: String,
}

impl ImportCmd {
    #[must_use]
    pub fn new(account_id: i64, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            account_id,
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

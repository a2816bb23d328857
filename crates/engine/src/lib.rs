//! Ledger and savings-goal engine.
//!
//! The [`Engine`] records financial movements against accounts, computes
//! balances from completed movements, tracks savings goals through their
//! status machine and builds movement reports. All state lives in the
//! database behind a `sea-orm` connection.

pub use accounts::Account;
pub use advice::{Advice, AdviceError, Advisor, FinancialSnapshot, TemplateAdvisor};
pub use commands::{AccountCmd, GoalCmd, ImportCmd, MovementCmd, MovementFilter, ReportParams};
pub use error::EngineError;
pub use goals::{Goal, GoalEvent, GoalKind, GoalStatus, completion_percentage};
pub use money::MoneyCents;
pub use movements::{
    Category, Movement, MovementEvent, MovementKind, MovementSource, MovementStatus,
};
pub use ops::{Engine, EngineBuilder, ImportSummary};
pub use reports::{AccountSummary, DEFAULT_REPORT_TITLE, Report, ReportTotals};

mod accounts;
pub mod advice;
mod commands;
mod error;
mod goals;
mod locks;
mod money;
mod movements;
mod ops;
mod reports;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;

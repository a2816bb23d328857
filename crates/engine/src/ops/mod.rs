use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{Advisor, EngineError, ResultEngine, TemplateAdvisor, locks::AccountLocks};

mod accounts;
mod advice;
mod balances;
mod goals;
mod imports;
mod movements;
mod reports;

pub use imports::ImportSummary;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: AccountLocks,
    advisor: Arc<dyn Advisor>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Reports storage constraint violations raised while running `operation`
/// as invalid input. The original error is only logged.
fn integrity_checked<T>(operation: &str, outcome: ResultEngine<T>) -> ResultEngine<T> {
    outcome.map_err(|err| {
        if err.is_integrity_violation() {
            tracing::warn!(operation, error = %err, "storage constraint violated");
            return EngineError::InvalidInput(format!("invalid data for {operation}"));
        }
        match &err {
            EngineError::Database(db_err) => {
                tracing::error!(operation, error = %db_err, "database failure");
            }
            other => tracing::warn!(operation, error = %other, "operation rejected"),
        }
        err
    })
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    advisor: Option<Arc<dyn Advisor>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the advice collaborator (defaults to [`TemplateAdvisor`]).
    pub fn advisor(mut self, advisor: Arc<dyn Advisor>) -> EngineBuilder {
        self.advisor = Some(advisor);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            locks: AccountLocks::default(),
            advisor: self
                .advisor
                .unwrap_or_else(|| Arc::new(TemplateAdvisor)),
        })
    }
}

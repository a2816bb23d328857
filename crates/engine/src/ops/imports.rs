use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::Deserialize;

use crate::{
    Category, EngineError, ImportCmd, MoneyCents, Movement, MovementCmd, MovementKind,
    MovementSource, MovementStatus, ResultEngine,
    util::{normalize_required_text, validate_id},
};

use super::{
    Engine, accounts::require_account, integrity_checked,
    movements::{external_id_taken, insert_movement, normalize_movement},
    with_tx,
};

/// Outcome of a CSV import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<Movement>,
    /// Rows whose external id was already present.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    date: String,
    kind: String,
    amount: String,
    description: String,
    category: String,
    #[serde(default)]
    external_id: Option<String>,
}

fn at_line(line: usize, err: EngineError) -> EngineError {
    match err {
        EngineError::InvalidInput(msg) => EngineError::InvalidInput(format!("line {line}: {msg}")),
        other => other,
    }
}

impl ImportRow {
    fn into_cmd(self, account_id: i64, file_name: &str) -> ResultEngine<MovementCmd> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidInput(format!("invalid date: {}", self.date)))?;
        let kind = MovementKind::try_from(self.kind.as_str())?;
        let amount: MoneyCents = self.amount.parse()?;
        let category = Category::try_from(self.category.as_str())?;

        let mut cmd = MovementCmd::new(account_id, kind, amount, self.description, category, date)
            .source(MovementSource::Import)
            .origin_file(file_name);
        cmd.external_id = self.external_id;
        Ok(cmd)
    }
}

fn parse_rows(content: &str) -> ResultEngine<Vec<(usize, ImportRow)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let row = record
            .map_err(|err| EngineError::InvalidInput(format!("line {line}: malformed row: {err}")))?;
        rows.push((line, row));
    }
    Ok(rows)
}

impl Engine {
    /// Imports movements from CSV as `COMPLETED` rows with source `IMPORT`.
    ///
    /// The header is `date,kind,amount,description,category,external_id`.
    /// Rows whose external id already exists are skipped. The whole file is
    /// one DB transaction: any bad row aborts the import.
    pub async fn import_movements(&self, cmd: ImportCmd, registered_at: DateTime<Utc>) -> ResultEngine<ImportSummary> {
        let outcome = async {
            let account_id = validate_id(cmd.account_id)?;
            let file_name = normalize_required_text(&cmd.file_name, "file name")?;
            let rows = parse_rows(&cmd.content)?;
            require_account(&self.database, account_id).await?;
            let _guard = self.locks.lock(account_id).await;

            with_tx!(self, |db_tx| {
                require_account(&db_tx, account_id).await?;
                let mut summary = ImportSummary {
                    imported: Vec::with_capacity(rows.len()),
                    skipped: 0,
                };
                for (line, row) in rows {
                    if let Some(external_id) = row.external_id.as_deref().map(str::trim)
                        && !external_id.is_empty()
                        && external_id_taken(&db_tx, external_id, None).await?
                    {
                        tracing::debug!(line, external_id, "duplicate external id skipped");
                        summary.skipped += 1;
                        continue;
                    }
                    let fields = row
                        .into_cmd(account_id, &file_name)
                        .and_then(|cmd| normalize_movement(&cmd))
                        .map_err(|err| at_line(line, err))?;
                    let movement =
                        insert_movement(&db_tx, fields, MovementStatus::Completed, registered_at)
                            .await
                            .map_err(|err| at_line(line, err))?;
                    summary.imported.push(movement);
                }
                Ok(summary)
            })
        }
        .await;
        let summary = integrity_checked("import movements", outcome)?;
        tracing::info!(
            account_id = cmd.account_id,
            file = %cmd.file_name,
            imported = summary.imported.len(),
            skipped = summary.skipped,
            "movements imported"
        );
        Ok(summary)
    }
}

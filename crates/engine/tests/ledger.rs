use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use engine::{
    Account, AccountCmd, Category, Engine, EngineError, ImportCmd, MoneyCents, MovementCmd,
    MovementFilter, MovementKind, MovementSource, MovementStatus,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn open_account(engine: &Engine, number: &str) -> Account {
    engine
        .register_account(AccountCmd::new(
            "Banco do Brasil",
            "0001",
            number,
            "CHECKING",
            "Ana Souza",
        ))
        .await
        .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    now().date_naive()
}

fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

fn income(account_id: i64, amount: i64, date: NaiveDate) -> MovementCmd {
    MovementCmd::income(account_id, cents(amount), "Invoice", Category::Sales, date)
}

fn expense(account_id: i64, amount: i64, date: NaiveDate) -> MovementCmd {
    MovementCmd::expense(account_id, cents(amount), "Power bill", Category::Utilities, date)
}

#[tokio::test]
async fn balance_follows_completed_movements_and_reversals() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    assert_eq!(engine.current_balance(account.id).await.unwrap(), MoneyCents::ZERO);

    let salary = engine
        .register_movement(income(account.id, 500_000, day(2024, 6, 5)), now())
        .await
        .unwrap();
    assert_eq!(salary.status, MovementStatus::Completed);
    assert_eq!(salary.source, MovementSource::Manual);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(500_000));

    let bill = engine
        .register_movement(expense(account.id, 200_000, day(2024, 6, 10)), now())
        .await
        .unwrap();
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(300_000));

    let reversed = engine.reverse_movement(bill.id).await.unwrap();
    assert_eq!(reversed.status, MovementStatus::Reversed);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(500_000));
}

#[tokio::test]
async fn snapshots_chain_prior_and_resulting_balances() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let first = engine
        .register_movement(income(account.id, 150_000, day(2024, 6, 1)), now())
        .await
        .unwrap();
    assert_eq!(first.prior_balance, MoneyCents::ZERO);
    assert_eq!(first.resulting_balance, cents(150_000));

    let second = engine
        .register_movement(expense(account.id, 45_90, day(2024, 6, 2)), now())
        .await
        .unwrap();
    assert_eq!(second.prior_balance, cents(150_000));
    assert_eq!(second.resulting_balance, cents(145_410));
    assert_eq!(second.registered_at, now());
}

#[tokio::test]
async fn reversal_leaves_snapshots_untouched() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let first = engine
        .register_movement(income(account.id, 100_000, day(2024, 6, 1)), now())
        .await
        .unwrap();
    let second = engine
        .register_movement(expense(account.id, 30_000, day(2024, 6, 2)), now())
        .await
        .unwrap();

    engine.reverse_movement(first.id).await.unwrap();

    let first = engine.movement(first.id).await.unwrap();
    let second_after = engine.movement(second.id).await.unwrap();
    assert_eq!(first.resulting_balance, cents(100_000));
    assert_eq!(second_after.prior_balance, second.prior_balance);
    assert_eq!(second_after.resulting_balance, second.resulting_balance);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(-30_000));
}

#[tokio::test]
async fn reversing_twice_is_a_conflict() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let movement = engine
        .register_movement(income(account.id, 10_000, day(2024, 6, 1)), now())
        .await
        .unwrap();

    engine.reverse_movement(movement.id).await.unwrap();
    let err = engine.reverse_movement(movement.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("movement already reversed".to_string())
    );
    assert_eq!(
        engine.movement(movement.id).await.unwrap().status,
        MovementStatus::Reversed
    );
}

#[tokio::test]
async fn non_positive_amounts_persist_nothing() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    for amount in [0, -1, -10_000] {
        let err = engine
            .register_movement(income(account.id, amount, day(2024, 6, 1)), now())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput("amount must be greater than zero".to_string())
        );
    }
    assert!(engine.list_movements().await.unwrap().is_empty());
    assert_eq!(engine.current_balance(account.id).await.unwrap(), MoneyCents::ZERO);
}

#[tokio::test]
async fn registration_validates_references_and_status() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let err = engine
        .register_movement(income(0, 100, day(2024, 6, 1)), now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("invalid id".to_string()));

    let err = engine
        .register_movement(income(99, 100, day(2024, 6, 1)), now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account 99".to_string()));

    let err = engine
        .register_movement(
            income(account.id, 100, day(2024, 6, 1)).status(MovementStatus::Reversed),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let blank = MovementCmd::income(account.id, cents(100), "   ", Category::Sales, day(2024, 6, 1));
    let err = engine.register_movement(blank, now()).await.unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("description is required".to_string()));

    assert!(engine.list_movements().await.unwrap().is_empty());
}

#[tokio::test]
async fn pending_movements_count_once_completed() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let pending = engine
        .register_movement(
            income(account.id, 80_000, day(2024, 6, 1)).status(MovementStatus::Pending),
            now(),
        )
        .await
        .unwrap();
    assert_eq!(pending.status, MovementStatus::Pending);
    assert_eq!(pending.resulting_balance, cents(80_000));
    assert_eq!(engine.current_balance(account.id).await.unwrap(), MoneyCents::ZERO);

    let completed = engine.complete_movement(pending.id).await.unwrap();
    assert_eq!(completed.status, MovementStatus::Completed);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(80_000));

    let cancelled = engine.cancel_movement(pending.id).await.unwrap();
    assert_eq!(cancelled.status, MovementStatus::Cancelled);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), MoneyCents::ZERO);

    assert!(matches!(
        engine.complete_movement(pending.id).await,
        Err(EngineError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn duplicate_external_id_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    engine
        .register_movement(income(account.id, 100, day(2024, 6, 1)).external_id("bank-1"), now())
        .await
        .unwrap();
    let err = engine
        .register_movement(income(account.id, 200, day(2024, 6, 2)).external_id("bank-1"), now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("external id bank-1".to_string()));
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(100));
}

#[tokio::test]
async fn update_restamps_snapshots_from_the_current_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    engine
        .register_movement(income(account.id, 500_000, day(2024, 6, 1)), now())
        .await
        .unwrap();
    let bill = engine
        .register_movement(expense(account.id, 100_000, day(2024, 6, 2)), now())
        .await
        .unwrap();
    assert_eq!(bill.prior_balance, cents(500_000));
    engine
        .register_movement(income(account.id, 200_000, day(2024, 6, 3)), now())
        .await
        .unwrap();

    let updated = engine
        .update_movement(
            bill.id,
            expense(account.id, 150_000, day(2024, 6, 2)).notes("corrected"),
        )
        .await
        .unwrap();
    // The balance read at edit time still includes the old 1000.00 expense.
    assert_eq!(updated.prior_balance, cents(600_000));
    assert_eq!(updated.resulting_balance, cents(450_000));
    assert_eq!(updated.registered_at, bill.registered_at);
    assert_eq!(updated.notes.as_deref(), Some("corrected"));
    assert_eq!(updated.status, MovementStatus::Completed);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(550_000));
}

#[tokio::test]
async fn update_status_goes_through_the_table() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let movement = engine
        .register_movement(income(account.id, 100, day(2024, 6, 1)), now())
        .await
        .unwrap();

    let err = engine
        .update_movement(
            movement.id,
            income(account.id, 100, day(2024, 6, 1)).status(MovementStatus::Pending),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let cancelled = engine
        .update_movement(
            movement.id,
            income(account.id, 100, day(2024, 6, 1)).status(MovementStatus::Cancelled),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, MovementStatus::Cancelled);
}

#[tokio::test]
async fn update_can_move_a_movement_to_another_account() {
    let (engine, _db) = engine_with_db().await;
    let first = open_account(&engine, "111").await;
    let second = open_account(&engine, "222").await;

    let movement = engine
        .register_movement(income(first.id, 10_000, day(2024, 6, 1)), now())
        .await
        .unwrap();
    let moved = engine
        .update_movement(movement.id, income(second.id, 10_000, day(2024, 6, 1)))
        .await
        .unwrap();
    assert_eq!(moved.account_id, second.id);
    assert_eq!(moved.prior_balance, MoneyCents::ZERO);
    assert_eq!(engine.current_balance(first.id).await.unwrap(), MoneyCents::ZERO);
    assert_eq!(engine.current_balance(second.id).await.unwrap(), cents(10_000));
}

#[tokio::test]
async fn account_listings_filter_and_order() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let other = open_account(&engine, "99999-9").await;

    let a = engine
        .register_movement(income(account.id, 100, day(2024, 5, 20)), now())
        .await
        .unwrap();
    let b = engine
        .register_movement(expense(account.id, 50, day(2024, 6, 10)), now())
        .await
        .unwrap();
    let c = engine
        .register_movement(income(account.id, 70, day(2024, 6, 3)), now())
        .await
        .unwrap();
    engine
        .register_movement(income(other.id, 999, day(2024, 6, 4)), now())
        .await
        .unwrap();

    let all = engine
        .account_movements(account.id, &MovementFilter::default(), today())
        .await
        .unwrap();
    let ids: Vec<i64> = all.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);

    let june = engine
        .movements_in_period(account.id, day(2024, 6, 1), day(2024, 6, 10), today())
        .await
        .unwrap();
    let ids: Vec<i64> = june.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![b.id, c.id]);

    let incomes = engine
        .movements_by_kind(account.id, MovementKind::Income, today())
        .await
        .unwrap();
    let ids: Vec<i64> = incomes.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);

    let filter = MovementFilter::default()
        .kind(MovementKind::Income)
        .period(day(2024, 6, 1), day(2024, 6, 30));
    let june_incomes = engine
        .account_movements(account.id, &filter, today())
        .await
        .unwrap();
    assert_eq!(june_incomes.len(), 1);
    assert_eq!(june_incomes[0].id, c.id);

    let err = engine
        .movements_in_period(account.id, day(2024, 6, 10), day(2024, 6, 1), today())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .movements_in_period(account.id, day(2024, 7, 1), day(2024, 7, 31), today())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn delete_movement_removes_the_row() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let movement = engine
        .register_movement(income(account.id, 100, day(2024, 6, 1)), now())
        .await
        .unwrap();

    engine.delete_movement(movement.id).await.unwrap();
    assert_eq!(
        engine.movement(movement.id).await.unwrap_err(),
        EngineError::KeyNotFound(format!("movement {}", movement.id))
    );
    assert!(matches!(
        engine.delete_movement(movement.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn balance_matches_completed_sums_after_mixed_operations() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let mut ids = Vec::new();
    for step in 1..=12_i64 {
        let cmd = if step % 3 == 0 {
            expense(account.id, step * 1_000, day(2024, 6, 1))
        } else {
            income(account.id, step * 700, day(2024, 6, 1))
        };
        let cmd = if step % 4 == 0 {
            cmd.status(MovementStatus::Pending)
        } else {
            cmd
        };
        ids.push(engine.register_movement(cmd, now()).await.unwrap().id);
    }
    engine.reverse_movement(ids[0]).await.unwrap();
    engine.cancel_movement(ids[4]).await.unwrap();
    engine.complete_movement(ids[7]).await.unwrap();

    let expected = engine
        .list_movements()
        .await
        .unwrap()
        .iter()
        .try_fold(MoneyCents::ZERO, |acc, m| acc.try_add(m.balance_effect()?))
        .unwrap();
    assert_eq!(engine.current_balance(account.id).await.unwrap(), expected);
}

/// Writes a completed row straight to the table, bypassing the amount cap.
async fn seed_completed(db: &DatabaseConnection, account_id: i64, kind: &str, amount_minor: i64) {
    db.execute_unprepared(&format!(
        "INSERT INTO movements (account_id, kind, amount_minor, description, category, \
         movement_date, registered_at, status, source, prior_balance_minor, resulting_balance_minor) \
         VALUES ({account_id}, '{kind}', {amount_minor}, 'Legacy', 'OTHER', '2024-01-01', \
         '2024-01-01T00:00:00+00:00', 'COMPLETED', 'MANUAL', 0, 0)"
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    for cmd in [
        income(account.id, i64::MAX, today()),
        expense(account.id, i64::MAX, today()),
    ] {
        let err = engine.register_movement(cmd, now()).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput("amount must not exceed 1000000000000.00".to_string())
        );
    }

    let largest = engine
        .register_movement(income(account.id, MoneyCents::MAX_AMOUNT.cents(), today()), now())
        .await
        .unwrap();
    assert_eq!(largest.resulting_balance, MoneyCents::MAX_AMOUNT);
    assert_eq!(engine.current_balance(account.id).await.unwrap(), MoneyCents::MAX_AMOUNT);
}

#[tokio::test]
async fn balance_overflow_is_invalid_input() {
    let (engine, db) = engine_with_db().await;
    let rich = open_account(&engine, "12345-6").await;
    let poor = open_account(&engine, "777").await;
    seed_completed(&db, rich.id, "INCOME", i64::MAX - 5).await;
    seed_completed(&db, poor.id, "EXPENSE", i64::MAX - 5).await;
    let too_large = EngineError::InvalidInput("amount too large".to_string());

    let err = engine
        .register_movement(income(rich.id, 100, today()), now())
        .await
        .unwrap_err();
    assert_eq!(err, too_large);
    let err = engine
        .register_movement(expense(poor.id, 100, today()), now())
        .await
        .unwrap_err();
    assert_eq!(err, too_large);

    // Expenses still fit on the income-heavy account.
    let spent = engine
        .register_movement(expense(rich.id, 100, today()), now())
        .await
        .unwrap();
    assert_eq!(spent.resulting_balance, cents(i64::MAX - 105));

    // A pending row fits the snapshot but not the completed income total.
    let pending = engine
        .register_movement(
            income(rich.id, 100, today()).status(MovementStatus::Pending),
            now(),
        )
        .await
        .unwrap();
    assert_eq!(pending.resulting_balance, cents(i64::MAX - 5));
    assert_eq!(engine.complete_movement(pending.id).await.unwrap_err(), too_large);
    assert_eq!(
        engine.movement(pending.id).await.unwrap().status,
        MovementStatus::Pending
    );

    assert_eq!(engine.current_balance(rich.id).await.unwrap(), cents(i64::MAX - 105));
    assert_eq!(engine.current_balance(poor.id).await.unwrap(), cents(-(i64::MAX - 5)));
}

#[tokio::test]
async fn concurrent_registrations_chain_snapshots() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let account_id = open_account(&engine, "12345-6").await.id;

    let mut handles = Vec::new();
    for n in 1..=8_i64 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .register_movement(income(account_id, n * 100, day(2024, 6, 1)), now())
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let movements = engine.list_movements().await.unwrap();
    assert_eq!(movements.len(), 8);
    let mut expected_prior = MoneyCents::ZERO;
    for movement in &movements {
        assert_eq!(movement.prior_balance, expected_prior);
        expected_prior = movement.resulting_balance;
    }
    assert_eq!(engine.current_balance(account_id).await.unwrap(), expected_prior);
}

#[tokio::test]
async fn accounts_are_unique_by_number() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;

    let err = engine
        .register_account(AccountCmd::new("Itau", "0002", " 12345-6 ", "SAVINGS", "Bruno"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("account number 12345-6".to_string()));

    let found = engine.account_by_number("12345-6").await.unwrap();
    assert_eq!(found, account);

    let other = open_account(&engine, "777").await;
    let err = engine
        .update_account(
            other.id,
            AccountCmd::new("Itau", "0002", "12345-6", "SAVINGS", "Bruno"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let renamed = engine
        .update_account(
            account.id,
            AccountCmd::new("Banco do Brasil", "0001", "12345-6", "CHECKING", "Ana S."),
        )
        .await
        .unwrap();
    assert_eq!(renamed.holder, "Ana S.");
    assert_eq!(engine.list_accounts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn accounts_in_use_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    engine
        .register_movement(income(account.id, 100, day(2024, 6, 1)), now())
        .await
        .unwrap();

    let err = engine.delete_account(account.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidInput("invalid data for delete account".to_string())
    );
    assert!(engine.account(account.id).await.is_ok());

    let unused = open_account(&engine, "555").await;
    engine.delete_account(unused.id).await.unwrap();
    assert!(matches!(
        engine.account(unused.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn csv_import_skips_known_external_ids() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let csv = "date,kind,amount,description,category,external_id\n\
               2024-06-01,INCOME,100.00,Invoice 1,SALES,x1\n\
               2024-06-02,EXPENSE,30.00,Lunch,FOOD,x2\n\
               2024-06-03,INCOME,5.00,Invoice 1 again,SALES,x1\n";

    let summary = engine
        .import_movements(ImportCmd::new(account.id, "june.csv", csv), now())
        .await
        .unwrap();
    assert_eq!(summary.imported.len(), 2);
    assert_eq!(summary.skipped, 1);
    let first = &summary.imported[0];
    assert_eq!(first.source, MovementSource::Import);
    assert_eq!(first.status, MovementStatus::Completed);
    assert_eq!(first.origin_file.as_deref(), Some("june.csv"));
    assert_eq!(first.external_id.as_deref(), Some("x1"));
    assert_eq!(summary.imported[1].prior_balance, cents(10_000));
    assert_eq!(engine.current_balance(account.id).await.unwrap(), cents(7_000));

    let again = engine
        .import_movements(ImportCmd::new(account.id, "june.csv", csv), now())
        .await
        .unwrap();
    assert!(again.imported.is_empty());
    assert_eq!(again.skipped, 3);
}

#[tokio::test]
async fn csv_import_is_all_or_nothing() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "12345-6").await;
    let csv = "date,kind,amount,description,category,external_id\n\
               2024-06-01,INCOME,100.00,Invoice 1,SALES,x1\n\
               2024-06-02,EXPENSE,abc,Lunch,FOOD,x2\n";

    let err = engine
        .import_movements(ImportCmd::new(account.id, "bad.csv", csv), now())
        .await
        .unwrap_err();
    assert!(matches!(&err, EngineError::InvalidInput(msg) if msg.starts_with("line 3:")));
    assert!(engine.list_movements().await.unwrap().is_empty());
}

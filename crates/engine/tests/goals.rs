use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Account, AccountCmd, AdviceError, Advisor, Category, Engine, EngineError, FinancialSnapshot,
    Goal, GoalCmd, GoalKind, GoalStatus, MoneyCents, MovementCmd,
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

async fn open_account(engine: &Engine) -> Account {
    engine
        .register_account(AccountCmd::new(
            "Caixa",
            "0104",
            "00012-3",
            "SAVINGS",
            "Marina Costa",
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

fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

fn emergency_fund(account_id: i64) -> GoalCmd {
    GoalCmd::new(
        account_id,
        "Emergency fund",
        GoalKind::EmergencyFund,
        cents(1_000_000),
        day(2024, 1, 1),
        day(2024, 12, 31),
    )
}

#[tokio::test]
async fn progress_reaches_completion() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;

    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();
    assert_eq!(goal.status, GoalStatus::Active);
    assert_eq!(goal.current, MoneyCents::ZERO);
    assert_eq!(goal.percentage.to_string(), "0.0000");
    assert_eq!(goal.registered_at, now());

    let goal = engine.add_progress(goal.id, cents(300_000)).await.unwrap();
    assert_eq!(goal.current, cents(300_000));
    assert_eq!(goal.percentage, dec!(30.0000));
    assert_eq!(goal.status, GoalStatus::Active);

    let goal = engine.add_progress(goal.id, cents(700_000)).await.unwrap();
    assert_eq!(goal.current, cents(1_000_000));
    assert_eq!(goal.percentage.to_string(), "100.0000");
    assert_eq!(goal.status, GoalStatus::Completed);

    let err = engine.add_progress(goal.id, cents(100)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("goal already completed".to_string())
    );

    let stored = engine.goal(goal.id).await.unwrap();
    assert_eq!(stored.current, cents(1_000_000));
    assert_eq!(stored.status, GoalStatus::Completed);
    assert_eq!(stored.percentage, dec!(100.0000));
}

#[tokio::test]
async fn progress_must_be_positive() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    let err = engine.add_progress(goal.id, MoneyCents::ZERO).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidInput("progress amount must be greater than zero".to_string())
    );
    assert_eq!(engine.goal(goal.id).await.unwrap().current, MoneyCents::ZERO);
}

#[tokio::test]
async fn creation_is_validated() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;

    let mut future = emergency_fund(account.id);
    future.start_date = day(2024, 7, 1);
    future.end_date = day(2024, 12, 31);
    assert_eq!(
        engine.create_goal(future, now()).await.unwrap_err(),
        EngineError::InvalidInput("start date must not be in the future".to_string())
    );

    let mut inverted = emergency_fund(account.id);
    inverted.end_date = day(2023, 1, 1);
    assert!(matches!(
        engine.create_goal(inverted, now()).await,
        Err(EngineError::InvalidInput(_))
    ));

    let mut zero = emergency_fund(account.id);
    zero.target = MoneyCents::ZERO;
    assert!(matches!(
        engine.create_goal(zero, now()).await,
        Err(EngineError::InvalidInput(_))
    ));

    assert!(matches!(
        engine.create_goal(emergency_fund(404), now()).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(engine.list_goals().await.unwrap().is_empty());
}

#[tokio::test]
async fn pause_and_reactivate() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    let err = engine.reactivate_goal(goal.id, now().date_naive()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("cannot reactivate a goal that is ACTIVE".to_string())
    );

    let paused = engine.pause_goal(goal.id).await.unwrap();
    assert_eq!(paused.status, GoalStatus::Paused);

    let err = engine.pause_goal(goal.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition("cannot pause a goal that is PAUSED".to_string())
    );

    // Paused goals still accept progress.
    let paused = engine.add_progress(goal.id, cents(10_000)).await.unwrap();
    assert_eq!(paused.status, GoalStatus::Paused);

    let active = engine.reactivate_goal(goal.id, now().date_naive()).await.unwrap();
    assert_eq!(active.status, GoalStatus::Active);

    engine.add_progress(goal.id, cents(990_000)).await.unwrap();
    assert!(matches!(
        engine.pause_goal(goal.id).await,
        Err(EngineError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn reactivation_past_deadline_is_allowed() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    engine.pause_goal(goal.id).await.unwrap();
    let active = engine.reactivate_goal(goal.id, day(2025, 3, 1)).await.unwrap();
    assert_eq!(active.status, GoalStatus::Active);
    assert_eq!(active.end_date, day(2024, 12, 31));
}

#[tokio::test]
async fn sweep_expires_overdue_open_goals_only() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;

    let mut short = emergency_fund(account.id);
    short.end_date = day(2024, 3, 31);
    let overdue_active = engine.create_goal(short.clone(), now()).await.unwrap();
    let overdue_paused = engine.create_goal(short.clone(), now()).await.unwrap();
    engine.pause_goal(overdue_paused.id).await.unwrap();
    let overdue_completed = engine.create_goal(short.clone(), now()).await.unwrap();
    engine.complete_goal(overdue_completed.id).await.unwrap();

    let mut ends_today = emergency_fund(account.id);
    ends_today.end_date = now().date_naive();
    let due_today = engine.create_goal(ends_today, now()).await.unwrap();
    let open = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    let flipped = engine.sweep_expired(now().date_naive()).await.unwrap();
    assert_eq!(flipped, 2);

    let status = |goal: Goal| goal.status;
    assert_eq!(status(engine.goal(overdue_active.id).await.unwrap()), GoalStatus::Expired);
    assert_eq!(status(engine.goal(overdue_paused.id).await.unwrap()), GoalStatus::Expired);
    assert_eq!(status(engine.goal(overdue_completed.id).await.unwrap()), GoalStatus::Completed);
    assert_eq!(status(engine.goal(due_today.id).await.unwrap()), GoalStatus::Active);
    assert_eq!(status(engine.goal(open.id).await.unwrap()), GoalStatus::Active);

    assert_eq!(engine.sweep_expired(now().date_naive()).await.unwrap(), 0);

    // Expiry is soft: progress is still accepted and can complete the goal.
    let revived = engine
        .add_progress(overdue_active.id, cents(1_000_000))
        .await
        .unwrap();
    assert_eq!(revived.status, GoalStatus::Completed);
}

#[tokio::test]
async fn account_goal_listings() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;

    let mut late = emergency_fund(account.id);
    late.end_date = day(2025, 6, 30);
    let late = engine.create_goal(late, now()).await.unwrap();

    let mut trip = GoalCmd::new(
        account.id,
        "Lisbon",
        GoalKind::Trip,
        cents(800_000),
        day(2024, 2, 1),
        day(2024, 9, 30),
    );
    trip.description = Some("  ".to_string());
    let trip = engine.create_goal(trip, now()).await.unwrap();
    assert_eq!(trip.description, None);

    let mut old = emergency_fund(account.id);
    old.end_date = day(2024, 5, 31);
    let old = engine.create_goal(old, now()).await.unwrap();

    let paused = engine.create_goal(emergency_fund(account.id), now()).await.unwrap();
    engine.pause_goal(paused.id).await.unwrap();

    let all: Vec<i64> = engine
        .account_goals(account.id)
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(all, vec![late.id, trip.id, old.id, paused.id]);

    let active: Vec<i64> = engine
        .active_goals(account.id)
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(active, vec![old.id, trip.id, late.id]);

    let expired: Vec<i64> = engine
        .expired_goals(account.id, now().date_naive())
        .await
        .unwrap()
        .iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(expired, vec![old.id]);

    let trips = engine.goals_by_kind(account.id, GoalKind::Trip).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].name, "Lisbon");

    assert!(matches!(
        engine.account_goals(0).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn update_keeps_progress_and_status() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();
    engine.add_progress(goal.id, cents(250_000)).await.unwrap();
    engine.pause_goal(goal.id).await.unwrap();

    let mut cmd = emergency_fund(account.id).notes("raised after the bonus");
    cmd.name = "Bigger cushion".to_string();
    cmd.target = cents(2_000_000);
    let updated = engine
        .update_goal(goal.id, cmd, now().date_naive())
        .await
        .unwrap();

    assert_eq!(updated.name, "Bigger cushion");
    assert_eq!(updated.current, cents(250_000));
    assert_eq!(updated.status, GoalStatus::Paused);
    assert_eq!(updated.percentage, dec!(12.5000));
    assert_eq!(updated.notes.as_deref(), Some("raised after the bonus"));
}

#[tokio::test]
async fn delete_goal() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    engine.delete_goal(goal.id).await.unwrap();
    assert_eq!(
        engine.goal(goal.id).await.unwrap_err(),
        EngineError::KeyNotFound(format!("goal {}", goal.id))
    );
    assert!(matches!(
        engine.delete_goal(-1).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[derive(Debug)]
struct BrokenAdvisor;

impl Advisor for BrokenAdvisor {
    fn generate_plan(&self, _: &Goal, _: &FinancialSnapshot) -> Result<String, AdviceError> {
        Err(AdviceError::Unavailable("model offline".to_string()))
    }

    fn analyze_viability(&self, _: &GoalCmd, _: &FinancialSnapshot) -> Result<String, AdviceError> {
        Err(AdviceError::Unavailable("model offline".to_string()))
    }

    fn suggest_optimizations(&self, _: &[Goal], _: &FinancialSnapshot) -> Result<String, AdviceError> {
        Err(AdviceError::Unavailable("model offline".to_string()))
    }
}

#[tokio::test]
async fn snapshot_averages_recent_completed_movements() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;

    for (date, amount) in [(day(2024, 4, 5), 500_000), (day(2024, 5, 5), 500_000), (day(2024, 6, 5), 500_000)] {
        engine
            .register_movement(
                MovementCmd::income(account.id, cents(amount), "Salary", Category::Salary, date),
                now(),
            )
            .await
            .unwrap();
    }
    engine
        .register_movement(
            MovementCmd::expense(account.id, cents(900_000), "Rent", Category::Housing, day(2024, 6, 1)),
            now(),
        )
        .await
        .unwrap();
    // Outside the window.
    engine
        .register_movement(
            MovementCmd::income(account.id, cents(999_999), "Bonus", Category::Salary, day(2023, 12, 20)),
            now(),
        )
        .await
        .unwrap();

    let snapshot = engine
        .financial_snapshot(account.id, now().date_naive())
        .await
        .unwrap();
    assert_eq!(snapshot.monthly_income, cents(500_000));
    assert_eq!(snapshot.monthly_expense, cents(300_000));
    assert_eq!(snapshot.monthly_capacity(), cents(200_000));
    assert_eq!(snapshot.balance, cents(1_599_999));
}

#[tokio::test]
async fn advice_uses_the_template_advisor_by_default() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    let plan = engine.goal_plan(goal.id, now().date_naive()).await.unwrap();
    assert!(!plan.degraded);
    assert!(plan.text.starts_with("# Action plan: Emergency fund"));

    let suggestions = engine
        .optimization_suggestions(account.id, now().date_naive())
        .await
        .unwrap();
    assert!(suggestions.text.contains("Emergency fund"));

    assert!(matches!(
        engine.goal_plan(77, now().date_naive()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn advisor_failures_degrade_to_fallback_text() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .advisor(Arc::new(BrokenAdvisor))
        .build()
        .await
        .unwrap();
    let account = open_account(&engine).await;
    let goal = engine
        .create_goal(emergency_fund(account.id), now())
        .await
        .unwrap();

    let plan = engine.goal_plan(goal.id, now().date_naive()).await.unwrap();
    assert!(plan.degraded);
    assert!(plan.text.starts_with("Advice is temporarily unavailable."));

    let viability = engine
        .goal_viability(emergency_fund(account.id), now().date_naive())
        .await
        .unwrap();
    assert!(viability.degraded);
}

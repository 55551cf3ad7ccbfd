use chrono::NaiveDate;
use sea_orm::Database;

use engine::{Engine, EngineError, EngineEvent, Money, TransactionKind, UserId};

async fn engine_with_user() -> (Engine, UserId) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::prepare(&db).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let user = engine.register("alice", "a@x.com", "pw123").await.unwrap();
    (engine, user)
}

async fn spend(engine: &Engine, user: UserId, cents: i64, category: &str) {
    engine
        .add_transaction(
            user,
            Money::new(cents),
            category,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            TransactionKind::Expense,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn ratio_requires_a_configured_budget() {
    let (engine, user) = engine_with_user().await;
    spend(&engine, user, 5_000, "Shopping").await;

    let err = engine.budget_ratio(user, "Shopping").await.unwrap_err();
    assert_eq!(err, EngineError::NotConfigured("Shopping".to_string()));
}

#[tokio::test]
async fn ratio_is_spend_over_budget() {
    let (engine, user) = engine_with_user().await;
    engine
        .set_budget(user, "Shopping", Money::new(20_000))
        .await
        .unwrap();
    assert_eq!(engine.budget_ratio(user, "shopping").await.unwrap(), 0.0);

    spend(&engine, user, 5_000, "Shopping").await;
    assert_eq!(engine.budget_ratio(user, "SHOPPING").await.unwrap(), 0.25);

    spend(&engine, user, 25_000, "shopping").await;
    assert_eq!(engine.budget_ratio(user, "Shopping").await.unwrap(), 1.5);
}

#[tokio::test]
async fn ratio_without_a_card_uses_the_log() {
    let (engine, user) = engine_with_user().await;
    spend(&engine, user, 1_000, "Books").await;
    spend(&engine, user, 500, "books").await;
    engine.set_budget(user, "Books", Money::new(3_000)).await.unwrap();

    assert_eq!(engine.budget_ratio(user, "Books").await.unwrap(), 0.5);
}

#[tokio::test]
async fn zero_budget_with_spend_is_infinite() {
    let (engine, user) = engine_with_user().await;
    engine.set_budget(user, "Shopping", Money::ZERO).await.unwrap();
    assert_eq!(engine.budget_ratio(user, "Shopping").await.unwrap(), 0.0);

    spend(&engine, user, 1, "Shopping").await;
    assert!(engine.budget_ratio(user, "Shopping").await.unwrap().is_infinite());
}

#[tokio::test]
async fn set_budget_updates_in_place() {
    let (engine, user) = engine_with_user().await;
    let first = engine
        .set_budget(user, "Food & Drink", Money::new(10_000))
        .await
        .unwrap();
    let second = engine
        .set_budget(user, "food & drink", Money::new(15_000))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let budgets = engine.list_budgets(user).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, Money::new(15_000));
    assert_eq!(budgets[0].category, "food & drink");
}

#[tokio::test]
async fn negative_budgets_are_rejected() {
    let (engine, user) = engine_with_user().await;
    let err = engine
        .set_budget(user, "Shopping", Money::new(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.list_budgets(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn removed_budget_is_not_configured() {
    let (engine, user) = engine_with_user().await;
    engine
        .set_budget(user, "Shopping", Money::new(10_000))
        .await
        .unwrap();
    engine.remove_budget(user, "shopping").await.unwrap();

    assert!(matches!(
        engine.budget_ratio(user, "Shopping").await,
        Err(EngineError::NotConfigured(_))
    ));
    assert!(matches!(
        engine.remove_budget(user, "Shopping").await,
        Err(EngineError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn overview_lists_every_budget_with_spend() {
    let (engine, user) = engine_with_user().await;
    spend(&engine, user, 3_000, "Transportation").await;
    spend(&engine, user, 800, "Books").await;
    engine
        .set_budget(user, "Transportation", Money::new(6_000))
        .await
        .unwrap();
    engine.set_budget(user, "Books", Money::new(1_600)).await.unwrap();
    engine.set_budget(user, "Shopping", Money::new(5_000)).await.unwrap();

    let overview = engine.budget_overview(user).await.unwrap();
    let rows: Vec<_> = overview
        .iter()
        .map(|status| (status.budget.category.as_str(), status.spent, status.ratio))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Books", Money::new(800), 0.5),
            ("Shopping", Money::ZERO, 0.0),
            ("Transportation", Money::new(3_000), 0.5),
        ]
    );
}

#[tokio::test]
async fn budget_changes_are_announced() {
    let (engine, user) = engine_with_user().await;
    let mut events = engine.subscribe();

    engine.set_budget(user, "Shopping", Money::new(100)).await.unwrap();
    engine.remove_budget(user, "Shopping").await.unwrap();

    for _ in 0..2 {
        assert_eq!(
            events.try_recv().unwrap(),
            EngineEvent::BudgetsChanged { user_id: user }
        );
    }
    assert!(events.try_recv().is_err());
}

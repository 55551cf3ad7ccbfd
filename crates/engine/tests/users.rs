use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, Statement};

use engine::{
    DEFAULT_CATEGORIES, Engine, EngineError, EngineEvent, Money, TransactionKind, UserId,
    verify_password,
};

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::prepare(&db).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn count_rows(engine: &Engine, table: &str, user_id: UserId) -> i64 {
    let db = engine.database();
    let column = if table == "users" { "id" } else { "user_id" };
    db.query_one(Statement::from_sql_and_values(
        db.get_database_backend(),
        format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?"),
        vec![user_id.0.into()],
    ))
    .await
    .unwrap()
    .unwrap()
    .try_get_by_index::<i64>(0)
    .unwrap()
}

#[tokio::test]
async fn register_lowercases_username() {
    let engine = engine_with_db().await;

    let user_id = engine.register("Alice", "a@x.com", "pw123").await.unwrap();

    assert_eq!(
        engine.get_username(user_id).await.unwrap().as_deref(),
        Some("alice")
    );
    let user = engine.user(user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "a@x.com");
}

#[tokio::test]
async fn duplicate_username_in_any_case_conflicts() {
    let engine = engine_with_db().await;
    engine.register("alice", "a@x.com", "pw123").await.unwrap();

    for variant in ["alice", "ALICE", "  Alice "] {
        let err = engine
            .register(variant, "other@x.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)), "{variant}: {err:?}");
    }
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let engine = engine_with_db().await;
    engine.register("alice", "a@x.com", "pw123").await.unwrap();

    let err = engine.register("bob", "a@x.com", "pw").await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(engine.is_user_exists("bob", "a@x.com").await.unwrap());
    assert!(!engine.is_user_exists("bob", "b@x.com").await.unwrap());
}

#[tokio::test]
async fn create_user_rechecks_uniqueness() {
    let engine = engine_with_db().await;
    engine.create_user("alice", "a@x.com", "$argon2id$stub").await.unwrap();

    let err = engine
        .create_user("ALICE", "z@x.com", "$argon2id$stub")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn registration_input_is_validated() {
    let engine = engine_with_db().await;

    for (username, email, password) in [
        ("", "a@x.com", "pw"),
        ("alice", "not-an-email", "pw"),
        ("alice", "a@x.com", ""),
    ] {
        let err = engine.register(username, email, password).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    let err = engine
        .register_with_confirmation("alice", "a@x.com", "pw1", "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(!engine.is_user_exists("alice", "a@x.com").await.unwrap());

    engine
        .register_with_confirmation("alice", "a@x.com", "pw1", "pw1")
        .await
        .unwrap();
}

#[tokio::test]
async fn stored_hash_verifies_the_password() {
    let engine = engine_with_db().await;
    let user_id = engine.register("alice", "a@x.com", "pw123").await.unwrap();

    let (found_id, hash) = engine
        .find_user_by_username("ALICE")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found_id, user_id);
    assert_ne!(hash, "pw123");
    assert!(verify_password("pw123", &hash).unwrap());
    assert!(!verify_password("pw124", &hash).unwrap());

    assert!(engine.find_user_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn authenticate_accepts_only_the_registered_pair() {
    let engine = engine_with_db().await;
    let user_id = engine.register("alice", "a@x.com", "pw123").await.unwrap();

    let identity = engine.authenticate("Alice", "pw123").await.unwrap();
    assert_eq!(identity.user_id, user_id);
    assert_eq!(identity.username, "alice");

    let wrong_password = engine.authenticate("alice", "nope").await.unwrap_err();
    let missing_user = engine.authenticate("mallory", "pw123").await.unwrap_err();
    assert_eq!(wrong_password, EngineError::Auth);
    assert_eq!(missing_user, EngineError::Auth);
    assert_eq!(wrong_password.to_string(), missing_user.to_string());
}

#[tokio::test]
async fn new_users_start_with_default_cards() {
    let engine = engine_with_db().await;
    let user_id = engine.register("alice", "a@x.com", "pw123").await.unwrap();

    let cards = engine.list_categories(user_id).await.unwrap();
    let labels: Vec<_> = cards.iter().map(|card| card.label.as_str()).collect();
    let expected: Vec<_> = DEFAULT_CATEGORIES.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, expected);
    assert_eq!(cards[0].icon_ref, "ic_food");
    assert!(cards.iter().all(|card| card.amount == Money::ZERO));

    engine.seed_default_categories(user_id).await.unwrap();
    assert_eq!(
        engine.list_categories(user_id).await.unwrap().len(),
        DEFAULT_CATEGORIES.len()
    );
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let engine = engine_with_db().await;
    let alice = engine.register("alice", "a@x.com", "pw123").await.unwrap();
    let bob = engine.register("bob", "b@x.com", "pw").await.unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    for user in [alice, bob] {
        engine
            .add_transaction(user, Money::new(500), "Shopping", date, TransactionKind::Expense)
            .await
            .unwrap();
        engine
            .set_budget(user, "Shopping", Money::new(10_000))
            .await
            .unwrap();
    }
    engine.create_category(alice, "Pets", "ic_pets").await.unwrap();

    let mut events = engine.subscribe();
    engine.delete_user(alice).await.unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        EngineEvent::UserDeleted { user_id: alice }
    );

    for table in ["users", "transactions", "budgets", "categories"] {
        assert_eq!(count_rows(&engine, table, alice).await, 0, "{table}");
        assert!(count_rows(&engine, table, bob).await > 0, "{table}");
    }
    assert_eq!(engine.authenticate("alice", "pw123").await, Err(EngineError::Auth));
    assert!(engine.get_username(alice).await.unwrap().is_none());

    let err = engine.delete_user(alice).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // The name is free again and gets a fresh id.
    let again = engine.register("alice", "a@x.com", "pw123").await.unwrap();
    assert_ne!(again, alice);
}

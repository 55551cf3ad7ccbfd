use chrono::{Local, NaiveDate};
use clap::Parser;
use engine::{Engine, EngineError, Money, SessionStore, TransactionDraft, UserId};

use cli::{BudgetCommand, Cli, Command};

mod cli;
mod settings;

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        match err.downcast_ref::<EngineError>() {
            Some(engine_err) if engine_err.is_storage() => eprintln!("operation failed"),
            _ => eprintln!("{err}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgettracker={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let database = sea_orm::Database::connect(settings.database_url()).await?;
    let outcome = migration::prepare(&database).await?;
    if outcome.recreated {
        eprintln!("warning: the local database could not be upgraded and was reset; all data was lost");
    }

    let engine = Engine::builder().database(database).build().await?;
    let mut session = SessionStore::open(&settings.session.path)?;
    engine.restore_session(&mut session).await?;

    match cli.command {
        Command::Register {
            username,
            email,
            password,
            confirm,
        } => {
            let user_id = match confirm {
                Some(confirm) => {
                    engine
                        .register_with_confirmation(&username, &email, &password, &confirm)
                        .await?
                }
                None => engine.register(&username, &email, &password).await?,
            };
            let username = engine
                .get_username(user_id)
                .await?
                .unwrap_or_else(|| username.to_lowercase());
            session.login(user_id, &username)?;
            println!("registered {username}");
        }
        Command::Login { username, password } => {
            let context = engine.login(&mut session, &username, &password).await?;
            println!("logged in as {}", context.username);
        }
        Command::Logout => {
            session.logout()?;
            println!("logged out");
        }
        Command::Whoami => match session.current() {
            Some(context) => println!("{} (id {})", context.username, context.user_id),
            None => println!("not logged in"),
        },
        Command::Add {
            amount,
            category,
            date,
            kind,
        } => {
            let user_id = require_login(&session)?;
            let date = date.unwrap_or_else(|| today().format("%Y-%m-%d").to_string());
            let draft = TransactionDraft::parse(&amount, &category, &date, &kind)?;
            let transaction = engine.insert_transaction(user_id, draft).await?;
            println!("added {}", transaction.id);
        }
        Command::Delete { id } => {
            let user_id = require_login(&session)?;
            engine.delete_transaction(user_id, id).await?;
            println!("deleted {id}");
        }
        Command::List => {
            let user_id = require_login(&session)?;
            for transaction in engine.list_transactions(user_id).await? {
                println!(
                    "{}  {}  {:>10}  {:<8}  {}",
                    transaction.id,
                    transaction.date,
                    transaction.amount,
                    transaction.kind.as_str(),
                    transaction.category
                );
            }
        }
        Command::Categories => {
            let user_id = require_login(&session)?;
            for card in engine.list_categories(user_id).await? {
                println!("{:<24} {:>10}  {}", card.label, card.amount, card.icon_ref);
            }
        }
        Command::NewCategory { label, icon } => {
            let user_id = require_login(&session)?;
            let card = engine.create_category(user_id, &label, &icon).await?;
            println!("{:<24} {:>10}  {}", card.label, card.amount, card.icon_ref);
        }
        Command::Summary => {
            let user_id = require_login(&session)?;
            let summary = engine.summary(user_id).await?;
            println!("income  {:>10}", summary.income);
            println!("expense {:>10}", summary.expense);
            println!("balance {:>10}", summary.balance);
        }
        Command::Budget { action } => {
            let user_id = require_login(&session)?;
            run_budget(&engine, user_id, action).await?;
        }
        Command::DeleteAccount => {
            let user_id = require_login(&session)?;
            engine.delete_user(user_id).await?;
            session.logout()?;
            println!("account deleted");
        }
    }

    Ok(())
}

async fn run_budget(engine: &Engine, user_id: UserId, action: BudgetCommand) -> AppResult<()> {
    match action {
        BudgetCommand::Set { category, amount } => {
            let amount: Money = amount.parse()?;
            let budget = engine.set_budget(user_id, &category, amount).await?;
            println!("{} {}", budget.category, budget.amount);
        }
        BudgetCommand::Remove { category } => {
            engine.remove_budget(user_id, &category).await?;
            println!("removed {category}");
        }
        BudgetCommand::List => {
            for status in engine.budget_overview(user_id).await? {
                println!(
                    "{:<24} {:>10} / {:>10}  {:>6.1}%",
                    status.budget.category,
                    status.spent,
                    status.budget.amount,
                    status.ratio * 100.0
                );
            }
        }
        BudgetCommand::Ratio { category } => {
            let ratio = engine.budget_ratio(user_id, &category).await?;
            println!("{ratio:.4}");
        }
    }
    Ok(())
}

fn require_login(session: &SessionStore) -> Result<UserId, EngineError> {
    session
        .current_user_id()
        .ok_or_else(|| EngineError::Validation("not logged in".to_string()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "budgettracker", version, about = "Personal income and expense tracker")]
pub struct Cli {
    /// Optional settings file (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and log into it.
    Register {
        username: String,
        email: String,
        #[arg(long, env = "BUDGETTRACKER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat the password; checked when given.
        #[arg(long)]
        confirm: Option<String>,
    },
    Login {
        username: String,
        #[arg(long, env = "BUDGETTRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the logged in user.
    Whoami,
    /// Record a transaction.
    Add {
        amount: String,
        category: String,
        /// `YYYY-MM-DD`, today when omitted.
        #[arg(long)]
        date: Option<String>,
        /// `income` or `expense`.
        #[arg(long = "type", default_value = "expense")]
        kind: String,
    },
    Delete {
        id: Uuid,
    },
    List,
    Categories,
    /// Add a custom category card.
    NewCategory {
        label: String,
        #[arg(long, default_value = "ic_category")]
        icon: String,
    },
    Summary,
    Budget {
        #[command(subcommand)]
        action: BudgetCommand,
    },
    /// Delete the logged in account with all of its data.
    DeleteAccount,
}

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    Set { category: String, amount: String },
    Remove { category: String },
    List,
    Ratio { category: String },
}

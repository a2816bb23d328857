use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{AccountCmd, Engine};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "moneta_admin")]
#[command(about = "Admin utilities for Moneta (accounts, balances, goal expiry)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./moneta.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    Account(Account),
    /// Print the current balance of an account.
    Balance(BalanceArgs),
    /// Flag overdue goals as expired. Meant to be run from cron.
    SweepExpired,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Add(AccountAddArgs),
    List,
}

#[derive(Args, Debug)]
struct AccountAddArgs {
    #[arg(long)]
    bank: String,
    #[arg(long)]
    agency: String,
    #[arg(long)]
    number: String,
    #[arg(long, default_value = "CHECKING")]
    kind: String,
    #[arg(long)]
    holder: String,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    /// Account id.
    #[arg(long)]
    account: i64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("moneta_admin=info,engine=warn")
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Migrate => {
            println!("database is up to date");
        }
        Command::Account(Account {
            command: AccountCommand::Add(args),
        }) => {
            let account = engine
                .register_account(AccountCmd::new(
                    args.bank,
                    args.agency,
                    args.number,
                    args.kind,
                    args.holder,
                ))
                .await?;
            println!(
                "created account: {} ({})",
                account.account_number, account.id
            );
        }
        Command::Account(Account {
            command: AccountCommand::List,
        }) => {
            for account in engine.list_accounts().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    account.id,
                    account.bank,
                    account.agency,
                    account.account_number,
                    account.account_kind,
                    account.holder
                );
            }
        }
        Command::Balance(args) => {
            let balance = engine.current_balance(args.account).await?;
            println!("{balance}");
        }
        Command::SweepExpired => {
            let expired = engine.sweep_expired(Utc::now().date_naive()).await?;
            tracing::info!(expired, "sweep finished");
            println!("expired goals: {expired}");
        }
    }

    Ok(())
}

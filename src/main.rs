// Expense Ledger - CLI
// Drives the account directory, the ledger, and the statistics views

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use std::env;
use std::path::{Path, PathBuf};

use expense_ledger::{
    export_to_path, summarize, AccountDirectory, Expense, ExpenseLedger, Session, SqliteStore,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("register") => run_register(&args[2..]),
        Some("add") => run_add(&args[2..]),
        Some("list") => run_list(&args[2..]),
        Some("stats") => run_stats(&args[2..]),
        Some("export") => run_export(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Expense Ledger v{}", expense_ledger::VERSION);
    println!();
    println!("Usage:");
    println!("  expense-ledger register <email> <password>");
    println!("  expense-ledger add <email> <password> <title> <amount> <category> [date] [notes]");
    println!("  expense-ledger list <email> <password>");
    println!("  expense-ledger stats <email> <password>");
    println!("  expense-ledger export <email> <password> <file.csv>");
    println!();
    println!("The database file defaults to ./expenses.db (override with EXPENSE_LEDGER_DB).");
}

fn db_path() -> PathBuf {
    env::var("EXPENSE_LEDGER_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("expenses.db"))
}

fn open_store() -> Result<SqliteStore> {
    let path = db_path();
    SqliteStore::open(&path).with_context(|| format!("Failed to open database {:?}", path))
}

/// Log in and load the account's ledger in one step.
fn open_ledger(
    store: &SqliteStore,
    email: &str,
    password: &str,
) -> Result<(Session, ExpenseLedger<SqliteStore>)> {
    let directory = AccountDirectory::new(store.clone());
    let session = directory.login(email, password)?;

    let mut ledger = ExpenseLedger::new(store.clone());
    ledger.load(Some(&session))?;

    Ok((session, ledger))
}

fn run_register(args: &[String]) -> Result<()> {
    let [email, password] = args else {
        return Err(anyhow!("usage: expense-ledger register <email> <password>"));
    };

    let store = open_store()?;
    let directory = AccountDirectory::new(store);
    let session = directory.register(email, password)?;

    println!("✓ Registered {} (account {})", session.email, session.id);
    Ok(())
}

fn run_add(args: &[String]) -> Result<()> {
    if args.len() < 5 {
        return Err(anyhow!(
            "usage: expense-ledger add <email> <password> <title> <amount> <category> [date] [notes]"
        ));
    }

    let amount: f64 = args[3]
        .parse()
        .with_context(|| format!("Invalid amount '{}'", args[3]))?;

    let date = match args.get(5) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?,
        None => Local::now().date_naive(),
    };
    let notes = args.get(6).cloned();

    let store = open_store()?;
    let (session, mut ledger) = open_ledger(&store, &args[0], &args[1])?;

    let expense = Expense::new(&args[2], amount, &args[4], date, notes);
    let id = expense.id.clone();
    ledger.add(Some(&session), expense)?;

    println!("✓ Added expense {} ({} on {})", id, args[2], date);
    println!("  {} expenses on record", ledger.list().len());
    Ok(())
}

fn run_list(args: &[String]) -> Result<()> {
    let [email, password] = args else {
        return Err(anyhow!("usage: expense-ledger list <email> <password>"));
    };

    let store = open_store()?;
    let (_, ledger) = open_ledger(&store, email, password)?;

    if ledger.list().is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    println!(
        "{:<38} {:<12} {:>10}  {:<16} {}",
        "ID", "DATE", "AMOUNT", "CATEGORY", "TITLE"
    );
    for expense in ledger.list() {
        println!(
            "{:<38} {:<12} {:>10}  {:<16} {}",
            expense.id,
            expense.date,
            expense.display_amount(),
            expense.category_label(),
            expense.title
        );
    }
    println!("\n{} expenses", ledger.list().len());
    Ok(())
}

fn run_stats(args: &[String]) -> Result<()> {
    let [email, password] = args else {
        return Err(anyhow!("usage: expense-ledger stats <email> <password>"));
    };

    let store = open_store()?;
    let (_, ledger) = open_ledger(&store, email, password)?;

    let summary = summarize(ledger.list(), Local::now().date_naive());

    println!("Total expenses:   {:.2}", summary.total);
    println!("Last 30 days:     {:.2}", summary.last_30_days);
    println!("Current month:    {:.2}", summary.current_month);

    if !summary.by_category.is_empty() {
        println!("\nBy category:");
        for entry in &summary.by_category {
            println!("  {:<20} {:>10.2}", entry.label, entry.total);
        }
    }

    println!("\nMonthly trend:");
    for bucket in &summary.monthly {
        println!("  {} {}  {:>10.2}", bucket.label, bucket.year, bucket.total);
    }

    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let [email, password, path] = args else {
        return Err(anyhow!(
            "usage: expense-ledger export <email> <password> <file.csv>"
        ));
    };

    let store = open_store()?;
    let (_, ledger) = open_ledger(&store, email, password)?;

    export_to_path(Path::new(path), ledger.list())?;

    println!("✓ Exported {} expenses to {}", ledger.list().len(), path);
    Ok(())
}

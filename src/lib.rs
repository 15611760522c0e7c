// Expense Ledger - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod account;
pub mod expense;
pub mod export;
pub mod ledger;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use account::{Account, AccountDirectory, AuthError, Session};
pub use expense::{Category, Expense};
pub use export::{export_to_path, write_csv};
pub use ledger::ExpenseLedger;
pub use stats::{
    by_category, monthly_totals, sum_in_range, sum_since, summarize, total, CategoryTotal,
    MonthTotal, Summary, DEFAULT_TREND_MONTHS,
};
pub use store::{
    expenses_key, KeyValueStore, MemoryStore, SqliteStore, StoreError, SESSION_KEY, USERS_KEY,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

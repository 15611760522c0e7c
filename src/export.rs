// CSV Export
// Writes a ledger snapshot as a flat CSV file

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::expense::Expense;

const HEADER: [&str; 6] = ["id", "title", "amount", "category", "date", "notes"];

/// Write a snapshot as CSV: header row, then one record per expense with
/// two-decimal amounts and ISO dates.
pub fn write_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER)
        .context("Failed to write CSV header")?;

    for expense in expenses {
        let amount = expense.display_amount();
        let date = expense.date.format("%Y-%m-%d").to_string();

        wtr.write_record([
            expense.id.as_str(),
            expense.title.as_str(),
            amount.as_str(),
            expense.category.as_str(),
            date.as_str(),
            expense.notes.as_deref().unwrap_or(""),
        ])
        .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Export a snapshot to a file at `path`.
pub fn export_to_path(path: &Path, expenses: &[Expense]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file {:?}", path))?;
    write_csv(file, expenses)
}

// ============================================================================
// TESTS
// ============================================================================

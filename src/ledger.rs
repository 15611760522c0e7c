// Expense Ledger
// Per-account ordered expense collection with CRUD over the injected store

use tracing::{debug, info};

use crate::account::Session;
use crate::expense::Expense;
use crate::store::{expenses_key, get_json, set_json, KeyValueStore, StoreError};

/// The per-account expense collection and its CRUD operations.
///
/// The active session is passed explicitly into every operation instead of
/// being re-read from ambient state. Without a session every operation is a
/// silent no-op: it returns `Ok` without touching the store or the in-memory
/// collection.
///
/// Every mutation follows the same sequence: compute the new full
/// collection, persist it under `expenses_<accountId>`, and only then
/// publish it as the in-memory state. A failed persist leaves the
/// previously published collection in place.
pub struct ExpenseLedger<S> {
    store: S,
    expenses: Vec<Expense>,
}

impl<S: KeyValueStore> ExpenseLedger<S> {
    pub fn new(store: S) -> Self {
        ExpenseLedger {
            store,
            expenses: Vec::new(),
        }
    }

    /// Load the persisted collection for the session's account, replacing
    /// the in-memory collection. Empty when nothing has been persisted yet.
    /// Called once per session start.
    pub fn load(&mut self, session: Option<&Session>) -> Result<(), StoreError> {
        let Some(session) = session else {
            return Ok(());
        };

        let stored: Option<Vec<Expense>> = get_json(&self.store, &expenses_key(&session.id))?;
        self.expenses = stored.unwrap_or_default();

        debug!(account = %session.id, count = self.expenses.len(), "ledger loaded");
        Ok(())
    }

    /// Append an expense. The caller supplies a record with a pre-assigned
    /// unique id (see [`Expense::new`]).
    pub fn add(&mut self, session: Option<&Session>, expense: Expense) -> Result<(), StoreError> {
        let Some(session) = session else {
            return Ok(());
        };

        let mut next = self.expenses.clone();
        next.push(expense);

        info!(account = %session.id, count = next.len(), "expense added");
        self.persist_and_publish(&session.id, next)
    }

    /// Replace the expense whose id matches `expense.id` with the full given
    /// record. Order is preserved. When no element matches, the collection
    /// is unchanged but is still re-persisted identically.
    pub fn update(
        &mut self,
        session: Option<&Session>,
        expense: Expense,
    ) -> Result<(), StoreError> {
        let Some(session) = session else {
            return Ok(());
        };

        let next: Vec<Expense> = self
            .expenses
            .iter()
            .map(|e| {
                if e.id == expense.id {
                    expense.clone()
                } else {
                    e.clone()
                }
            })
            .collect();

        debug!(account = %session.id, id = %expense.id, "expense updated");
        self.persist_and_publish(&session.id, next)
    }

    /// Remove the expense with the matching id. No-op when absent.
    pub fn delete(&mut self, session: Option<&Session>, id: &str) -> Result<(), StoreError> {
        let Some(session) = session else {
            return Ok(());
        };

        let next: Vec<Expense> = self
            .expenses
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();

        debug!(account = %session.id, id, "expense deleted");
        self.persist_and_publish(&session.id, next)
    }

    /// The current in-memory collection, insertion order preserved.
    pub fn list(&self) -> &[Expense] {
        &self.expenses
    }

    /// Pure view over [`list`](Self::list): case-insensitive title substring
    /// match plus optional exact category key match.
    pub fn filter(&self, query: &str, category: Option<&str>) -> Vec<&Expense> {
        let needle = query.to_lowercase();

        self.expenses
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&needle))
            .filter(|e| category.map_or(true, |c| e.category == c))
            .collect()
    }

    // Persist first, publish second: readers never observe a collection
    // that is not yet durable.
    fn persist_and_publish(
        &mut self,
        account_id: &str,
        next: Vec<Expense>,
    ) -> Result<(), StoreError> {
        set_json(&self.store, &expenses_key(account_id), &next)?;
        self.expenses = next;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Expense;
    use crate::store::{MemoryStore, SESSION_KEY};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_session() -> Session {
        Session {
            id: "acct-1".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn create_test_expense(title: &str, amount: f64, category: &str) -> Expense {
        Expense::new(title, amount, category, date(2026, 1, 15), None)
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(MemoryStore::new());

        for title in ["first", "second", "third"] {
            ledger
                .add(Some(&session), create_test_expense(title, 1.0, "food"))
                .unwrap();
        }

        let titles: Vec<&str> = ledger.list().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_update_replaces_all_fields_in_place() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(MemoryStore::new());

        ledger
            .add(Some(&session), create_test_expense("a", 1.0, "food"))
            .unwrap();
        ledger
            .add(Some(&session), create_test_expense("b", 2.0, "food"))
            .unwrap();
        ledger
            .add(Some(&session), create_test_expense("c", 3.0, "food"))
            .unwrap();

        let mut replacement = ledger.list()[1].clone();
        replacement.title = "groceries".to_string();
        replacement.amount = 42.0;
        replacement.category = "shopping".to_string();
        replacement.date = date(2026, 2, 2);
        replacement.notes = Some("weekly run".to_string());

        ledger.update(Some(&session), replacement.clone()).unwrap();

        assert_eq!(ledger.list().len(), 3);
        assert_eq!(ledger.list()[1], replacement);
        assert_eq!(ledger.list()[0].title, "a");
        assert_eq!(ledger.list()[2].title, "c");
    }

    #[test]
    fn test_update_unknown_id_leaves_collection_unchanged_but_persists() {
        let session = create_test_session();
        let store = MemoryStore::new();
        let mut ledger = ExpenseLedger::new(store.clone());

        ledger
            .add(Some(&session), create_test_expense("a", 1.0, "food"))
            .unwrap();
        let before = ledger.list().to_vec();

        let ghost = create_test_expense("ghost", 9.0, "other");
        ledger.update(Some(&session), ghost).unwrap();

        assert_eq!(ledger.list(), before.as_slice());

        // Still re-persisted identically
        let persisted: Vec<Expense> =
            crate::store::get_json(&store, &expenses_key("acct-1")).unwrap().unwrap();
        assert_eq!(persisted, before);
    }

    #[test]
    fn test_delete_removes_exactly_one_by_id() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(MemoryStore::new());

        ledger
            .add(Some(&session), create_test_expense("a", 1.0, "food"))
            .unwrap();
        ledger
            .add(Some(&session), create_test_expense("b", 2.0, "food"))
            .unwrap();

        let victim = ledger.list()[0].id.clone();
        ledger.delete(Some(&session), &victim).unwrap();

        assert_eq!(ledger.list().len(), 1);
        assert_eq!(ledger.list()[0].title, "b");

        // Deleting a non-existent id leaves length unchanged
        ledger.delete(Some(&session), "no-such-id").unwrap();
        assert_eq!(ledger.list().len(), 1);
    }

    #[test]
    fn test_operations_without_session_are_silent_noops() {
        let store = MemoryStore::new();
        let mut ledger = ExpenseLedger::new(store.clone());

        ledger.load(None).unwrap();
        ledger
            .add(None, create_test_expense("a", 1.0, "food"))
            .unwrap();
        ledger
            .update(None, create_test_expense("a", 1.0, "food"))
            .unwrap();
        ledger.delete(None, "any-id").unwrap();

        assert!(ledger.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_roundtrip_through_fresh_ledger() {
        let session = create_test_session();
        let store = MemoryStore::new();

        let expense = Expense::new(
            "Museum tickets",
            24.99,
            "entertainment",
            date(2026, 3, 8),
            Some("with friends".to_string()),
        );

        let mut ledger = ExpenseLedger::new(store.clone());
        ledger.add(Some(&session), expense.clone()).unwrap();
        drop(ledger);

        // Fresh session for the same account sees the record unchanged
        let mut fresh = ExpenseLedger::new(store);
        fresh.load(Some(&session)).unwrap();
        assert_eq!(fresh.list(), &[expense]);
    }

    #[test]
    fn test_load_for_account_without_data_yields_empty() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(MemoryStore::new());

        ledger.load(Some(&session)).unwrap();
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_accounts_are_partitioned() {
        let store = MemoryStore::new();
        let ada = create_test_session();
        let bob = Session {
            id: "acct-2".to_string(),
            email: "bob@example.com".to_string(),
        };

        let mut ledger = ExpenseLedger::new(store.clone());
        ledger
            .add(Some(&ada), create_test_expense("ada's", 1.0, "food"))
            .unwrap();

        let mut other = ExpenseLedger::new(store);
        other.load(Some(&bob)).unwrap();
        assert!(other.list().is_empty());
    }

    #[test]
    fn test_filter_by_title_and_category() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(MemoryStore::new());

        ledger
            .add(Some(&session), create_test_expense("Grocery run", 30.0, "food"))
            .unwrap();
        ledger
            .add(Some(&session), create_test_expense("Gas", 40.0, "transportation"))
            .unwrap();
        ledger
            .add(Some(&session), create_test_expense("Great pizza", 15.0, "food"))
            .unwrap();

        let by_title = ledger.filter("gr", None);
        assert_eq!(by_title.len(), 2);

        let by_both = ledger.filter("gr", Some("food"));
        assert_eq!(by_both.len(), 2);

        let nothing = ledger.filter("gr", Some("transportation"));
        assert!(nothing.is_empty());

        let all = ledger.filter("", None);
        assert_eq!(all.len(), 3);
    }

    // A store whose writes fail, to observe the persist-before-publish order.
    #[derive(Clone)]
    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend(rusqlite::Error::InvalidQuery))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_persist_keeps_published_state_unchanged() {
        let session = create_test_session();
        let mut ledger = ExpenseLedger::new(FailingStore);

        let result = ledger.add(Some(&session), create_test_expense("a", 1.0, "food"));
        assert!(result.is_err());
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_session_key_untouched_by_ledger() {
        let store = MemoryStore::new();
        let session = create_test_session();

        let mut ledger = ExpenseLedger::new(store.clone());
        ledger
            .add(Some(&session), create_test_expense("a", 1.0, "food"))
            .unwrap();

        assert!(store.get(SESSION_KEY).unwrap().is_none());
    }
}

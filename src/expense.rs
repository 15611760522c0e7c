// Expense Record + Category Set
// One spending record owned by one account, plus the fixed category labels

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// EXPENSE
// ============================================================================

/// A single spending record.
///
/// `id` is an opaque UUID assigned at creation and preserved across updates.
/// `amount` is currency with two-decimal display precision; persisted values
/// may carry it as a numeric string, so deserialization normalizes both forms
/// to a number. `date` is persisted as text and parsed back before any
/// comparison; a trailing time component is tolerated and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,

    pub title: String,

    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,

    /// Category key. Usually one of [`Category::ALL`], but unrecognized
    /// keys are preserved verbatim and displayed as-is.
    pub category: String,

    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Expense {
    /// Create an expense with a fresh UUID.
    pub fn new(
        title: &str,
        amount: f64,
        category: &str,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Self {
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            amount,
            category: category.to_string(),
            date,
            notes,
        }
    }

    /// Amount formatted for display, always two decimals.
    pub fn display_amount(&self) -> String {
        format!("{:.2}", self.amount)
    }

    /// Human-readable label for this expense's category.
    pub fn category_label(&self) -> &str {
        Category::label_for(&self.category)
    }
}

/// Accept an amount as either a JSON number or a numeric string.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
    }

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => Ok(n),
        RawAmount::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", s, e))),
    }
}

/// Parse a calendar date from `YYYY-MM-DD`, tolerating a trailing
/// time component such as `2024-01-15T10:30:00Z`.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.split('T').next().unwrap_or(raw.as_str());
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{}': {}", raw, e)))
}

// ============================================================================
// CATEGORY
// ============================================================================

/// The fixed category set, each with a human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Healthcare,
    Shopping,
    Personal,
    Education,
    Travel,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Food,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Shopping,
        Category::Personal,
        Category::Education,
        Category::Travel,
        Category::Other,
    ];

    /// Storage key for this category.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Healthcare => "healthcare",
            Category::Shopping => "shopping",
            Category::Personal => "personal",
            Category::Education => "education",
            Category::Travel => "travel",
            Category::Other => "other",
        }
    }

    /// Display label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Personal => "Personal Care",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }

    /// Look up a category by its storage key.
    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// Resolve a raw key to its display label, falling back to the raw
    /// key when it is not one of the fixed set.
    pub fn label_for(key: &str) -> &str {
        match Category::from_key(key) {
            Some(category) => category.label(),
            None => key,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_expense_gets_unique_id() {
        let a = Expense::new("Coffee", 4.50, "food", date(2026, 1, 15), None);
        let b = Expense::new("Coffee", 4.50, "food", date(2026, 1, 15), None);

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_amount_deserializes_from_number_and_string() {
        let from_number: Expense = serde_json::from_str(
            r#"{"id":"1","title":"Lunch","amount":12.5,"category":"food","date":"2026-01-15"}"#,
        )
        .unwrap();
        assert_eq!(from_number.amount, 12.5);

        let from_string: Expense = serde_json::from_str(
            r#"{"id":"1","title":"Lunch","amount":"12.50","category":"food","date":"2026-01-15"}"#,
        )
        .unwrap();
        assert_eq!(from_string.amount, 12.5);
    }

    #[test]
    fn test_amount_rejects_garbage_string() {
        let result: Result<Expense, _> = serde_json::from_str(
            r#"{"id":"1","title":"Lunch","amount":"a lot","category":"food","date":"2026-01-15"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_date_tolerates_time_component() {
        let expense: Expense = serde_json::from_str(
            r#"{"id":"1","title":"Rent","amount":900,"category":"housing","date":"2026-02-01T09:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(expense.date, date(2026, 2, 1));
    }

    #[test]
    fn test_serialized_date_is_plain_iso_day() {
        let expense = Expense::new("Rent", 900.0, "housing", date(2026, 2, 1), None);
        let json = serde_json::to_string(&expense).unwrap();
        assert!(json.contains("\"date\":\"2026-02-01\""));
    }

    #[test]
    fn test_notes_are_optional() {
        let expense: Expense = serde_json::from_str(
            r#"{"id":"1","title":"Bus","amount":2,"category":"transportation","date":"2026-01-03"}"#,
        )
        .unwrap();
        assert!(expense.notes.is_none());

        let json = serde_json::to_string(&expense).unwrap();
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_display_amount_two_decimals() {
        let expense = Expense::new("Coffee", 4.5, "food", date(2026, 1, 15), None);
        assert_eq!(expense.display_amount(), "4.50");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::label_for("food"), "Food & Dining");
        assert_eq!(Category::label_for("personal"), "Personal Care");
        assert_eq!(Category::label_for("travel"), "Travel");
    }

    #[test]
    fn test_unknown_category_key_is_preserved() {
        assert_eq!(Category::label_for("crypto"), "crypto");
        assert!(Category::from_key("crypto").is_none());
    }

    #[test]
    fn test_every_category_key_roundtrips() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
    }
}

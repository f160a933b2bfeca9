// 🧄 Ledger Entry - the one record everything else is derived from
// Core fields are replaced wholesale on edit; identity never changes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Wire/storage format of the ledger date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// ENTRY KIND
// ============================================================================

/// Direction of money flow. The sign of an entry lives here, never in `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "INCOME",
            EntryKind::Expense => "EXPENSE",
        }
    }

    /// Parse the wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Some(EntryKind::Income),
            "EXPENSE" => Some(EntryKind::Expense),
            _ => None,
        }
    }

    /// +1 for income, -1 for expense
    pub fn sign(&self) -> f64 {
        match self {
            EntryKind::Income => 1.0,
            EntryKind::Expense => -1.0,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// ENTRY CANDIDATE (unvalidated extraction, not yet committed)
// ============================================================================

fn default_currency() -> String {
    "USD".to_string()
}

/// Structured fields extracted from free text or audio, awaiting commit.
///
/// `amount`, `category`, `date` and `type` are required on the wire; a
/// payload missing any of them fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCandidate {
    pub amount: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub category: String,

    #[serde(default)]
    pub description: String,

    pub date: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl EntryCandidate {
    pub fn new(amount: f64, category: &str, date: &str, kind: EntryKind) -> Self {
        EntryCandidate {
            amount,
            currency: default_currency(),
            category: category.to_string(),
            description: String::new(),
            date: date.to_string(),
            kind,
        }
    }

    /// Builder pattern: set currency
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Builder pattern: set description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

// ============================================================================
// ENTRY PATCH (partial update)
// ============================================================================

/// Fields to overwrite on an existing entry. `id` and `timestamp` are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// A committed ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Stable identity (UUID) - assigned once, never reused
    pub id: String,

    /// Non-negative magnitude; sign comes from `kind`
    pub amount: f64,

    pub currency: String,

    /// Grouping key (case-sensitive)
    pub category: String,

    #[serde(default)]
    pub description: String,

    /// Ledger date `YYYY-MM-DD`, distinct from creation time
    pub date: String,

    /// Creation instant, used for ordering only (epoch millis on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default)]
    pub is_ai_generated: bool,
}

impl Entry {
    /// Commit a candidate: fresh UUID, creation time = now
    pub fn from_candidate(candidate: EntryCandidate, is_ai_generated: bool) -> Self {
        Entry {
            id: uuid::Uuid::new_v4().to_string(),
            amount: candidate.amount,
            currency: candidate.currency,
            category: candidate.category,
            description: candidate.description,
            date: candidate.date,
            timestamp: Utc::now(),
            kind: candidate.kind,
            is_ai_generated,
        }
    }

    /// `+amount` for income, `-amount` for expense
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }

    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryKind::Expense
    }

    /// Parsed ledger date, `None` when the stored string is malformed
    pub fn ledger_date(&self) -> Option<NaiveDate> {
        parse_ledger_date(&self.date)
    }

    /// Overwrite every field the patch carries; `id` and `timestamp` survive
    pub fn apply_patch(&mut self, patch: &EntryPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(flag) = patch.is_ai_generated {
            self.is_ai_generated = flag;
        }
    }

    /// Content hash for idempotent CSV re-import
    /// NOTE: this is for DEDUPLICATION, not IDENTITY (identity = id)
    pub fn compute_content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.date, self.amount, self.category, self.description, self.kind
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Parse a `YYYY-MM-DD` ledger date
pub fn parse_ledger_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Format a date the way entries store it
pub fn format_ledger_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ============================================================================
// TESTS
// ============================================================================

// 🗃️ Entry Store - explicit state container for the ledger
// Loaded once, mutated by add/update/delete intents, persisted whole on
// every mutation (last write wins). A mutation only lands in memory once the
// repository accepted it.

use crate::data_quality::{validate_amount, validate_candidate, validate_patch};
use crate::db::Event;
use crate::entry::{Entry, EntryCandidate, EntryKind, EntryPatch};
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

// ============================================================================
// PERSISTENCE COLLABORATOR
// ============================================================================

/// Durable storage for the whole collection.
pub trait EntryRepository {
    /// Stored collection, or `None` when nothing (readable) is stored.
    /// Corrupt data must be swallowed here, never surfaced.
    fn load(&self) -> Option<Vec<Entry>>;

    /// Replace the stored collection
    fn save(&mut self, entries: &[Entry]) -> LedgerResult<()>;

    /// Append to the audit trail; storage without one ignores it
    fn record_event(&mut self, _event: &Event) -> LedgerResult<()> {
        Ok(())
    }
}

/// Volatile repository, used by tests
#[derive(Debug, Default)]
pub struct MemoryRepository {
    pub stored: Option<Vec<Entry>>,
    pub events: Vec<Event>,
    pub save_count: usize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryRepository for MemoryRepository {
    fn load(&self) -> Option<Vec<Entry>> {
        self.stored.clone()
    }

    fn save(&mut self, entries: &[Entry]) -> LedgerResult<()> {
        self.stored = Some(entries.to_vec());
        self.save_count += 1;
        Ok(())
    }

    fn record_event(&mut self, event: &Event) -> LedgerResult<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

// ============================================================================
// ARCHIVE FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Income => entry.kind == EntryKind::Income,
            EntryFilter::Expense => entry.kind == EntryKind::Expense,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            EntryFilter::All => EntryFilter::Income,
            EntryFilter::Income => EntryFilter::Expense,
            EntryFilter::Expense => EntryFilter::All,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            EntryFilter::All => "ALL",
            EntryFilter::Income => "INCOME",
            EntryFilter::Expense => "EXPENSE",
        }
    }
}

// ============================================================================
// ENTRY STORE
// ============================================================================

pub struct EntryStore<R: EntryRepository> {
    entries: Vec<Entry>,
    repo: R,
}

impl<R: EntryRepository> EntryStore<R> {
    /// Load the collection once; unreadable storage starts empty
    pub fn open(repo: R) -> Self {
        let entries = repo.load().unwrap_or_default();
        info!(count = entries.len(), "ledger loaded");
        EntryStore { entries, repo }
    }

    /// Collection in storage order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Archive view: filtered, newest first by creation time
    pub fn newest_first(&self, filter: EntryFilter) -> Vec<&Entry> {
        let mut list: Vec<&Entry> = self.entries.iter().filter(|e| filter.matches(e)).collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }

    /// Commit a candidate as a new entry
    pub fn add(&mut self, candidate: EntryCandidate, is_ai_generated: bool) -> LedgerResult<Entry> {
        let report = validate_candidate(&candidate);
        if report.has_critical_issues() {
            return Err(LedgerError::Input(report.critical_summary()));
        }

        let entry = Entry::from_candidate(candidate, is_ai_generated);
        let mut next = Vec::with_capacity(self.entries.len() + 1);
        next.push(entry.clone());
        next.extend(self.entries.iter().cloned());

        self.commit(next)?;
        debug!(id = %entry.id, amount = entry.amount, kind = %entry.kind, "entry added");

        self.record("entry_added", &entry.id, serde_json::json!(entry));
        Ok(entry)
    }

    /// Merge the patch into an existing entry; `id` is never changed
    pub fn update(&mut self, id: &str, patch: &EntryPatch) -> LedgerResult<Entry> {
        let report = validate_patch(patch);
        if report.has_critical_issues() {
            return Err(LedgerError::Input(report.critical_summary()));
        }

        let index = self.position(id)?;
        let mut next = self.entries.clone();
        next[index].apply_patch(patch);
        let updated = next[index].clone();

        self.commit(next)?;
        debug!(id = %updated.id, "entry updated");

        self.record("entry_updated", id, serde_json::json!(patch));
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> LedgerResult<Entry> {
        let index = self.position(id)?;
        let mut next = self.entries.clone();
        let removed = next.remove(index);

        self.commit(next)?;
        debug!(id = %removed.id, "entry deleted");

        self.record("entry_deleted", id, serde_json::json!(removed));
        Ok(removed)
    }

    /// Merge externally sourced entries, skipping content already present
    /// (same date/amount/category/description/type) and ids already taken.
    /// Entries whose amount fails validation are dropped.
    /// Returns the number of inserted entries.
    pub fn import(&mut self, incoming: Vec<Entry>) -> LedgerResult<usize> {
        let mut hashes: HashSet<String> =
            self.entries.iter().map(|e| e.compute_content_hash()).collect();
        let mut ids: HashSet<String> = self.entries.iter().map(|e| e.id.clone()).collect();

        let mut next = self.entries.clone();
        let mut inserted = 0;
        let mut duplicates = 0;
        let mut rejected = 0;

        for mut entry in incoming {
            let check = validate_amount(entry.amount);
            if check.is_blocking() {
                warn!(id = %entry.id, amount = entry.amount, "dropping imported entry: {}", check.message);
                rejected += 1;
                continue;
            }

            let hash = entry.compute_content_hash();
            if hashes.contains(&hash) {
                duplicates += 1;
                continue;
            }
            if entry.id.is_empty() || ids.contains(&entry.id) {
                entry.id = uuid::Uuid::new_v4().to_string();
            }

            hashes.insert(hash);
            ids.insert(entry.id.clone());
            next.push(entry);
            inserted += 1;
        }

        if inserted > 0 {
            self.commit(next)?;
            self.record(
                "entries_imported",
                "*",
                serde_json::json!({ "inserted": inserted, "duplicates": duplicates }),
            );
        }
        info!(inserted, duplicates, rejected, "import merged");
        Ok(inserted)
    }

    fn position(&self, id: &str) -> LedgerResult<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Save `next` and only then make it the in-memory collection
    fn commit(&mut self, next: Vec<Entry>) -> LedgerResult<()> {
        self.repo.save(&next)?;
        self.entries = next;
        Ok(())
    }

    fn record(&mut self, event_type: &str, entity_id: &str, data: serde_json::Value) {
        let event = Event::new(event_type, "entry", entity_id, data, "ledger");
        if let Err(e) = self.repo.record_event(&event) {
            warn!(error = %e, event_type, "failed to record audit event");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

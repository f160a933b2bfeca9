// 💾 SQLite persistence - whole-collection snapshots + audit event log
// CSV import/export lives here too

use crate::data_quality::validate_amount;
use crate::entry::{Entry, EntryKind};
use crate::error::{LedgerError, LedgerResult};
use crate::store::EntryRepository;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Event for audit trail ("every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Entries Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            timestamp_ms INTEGER NOT NULL,
            kind TEXT NOT NULL,
            is_ai_generated INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute("CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date)", [])?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

/// Read every stored entry. Any undecodable row fails the whole read.
pub fn get_all_entries(conn: &Connection) -> LedgerResult<Vec<Entry>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, currency, category, description, date,
                timestamp_ms, kind, is_ai_generated
         FROM entries",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, bool>(8)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, amount, currency, category, description, date, ts, kind, is_ai_generated)| {
                let kind = EntryKind::parse(&kind).ok_or_else(|| {
                    LedgerError::StorageCorruption(format!("entry {} has type '{}'", id, kind))
                })?;
                let timestamp = Utc.timestamp_millis_opt(ts).single().ok_or_else(|| {
                    LedgerError::StorageCorruption(format!("entry {} has timestamp {}", id, ts))
                })?;

                Ok(Entry {
                    id,
                    amount,
                    currency,
                    category,
                    description,
                    date,
                    timestamp,
                    kind,
                    is_ai_generated,
                })
            },
        )
        .collect()
}

/// Replace the stored collection in one transaction
pub fn replace_all_entries(conn: &mut Connection, entries: &[Entry]) -> LedgerResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM entries", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO entries (
                id, amount, currency, category, description, date,
                timestamp_ms, kind, is_ai_generated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for entry in entries {
            stmt.execute(params![
                entry.id,
                entry.amount,
                entry.currency,
                entry.category,
                entry.description,
                entry.date,
                entry.timestamp.timestamp_millis(),
                entry.kind.as_str(),
                entry.is_ai_generated,
            ])?;
        }
    }

    tx.commit()?;
    debug!(count = entries.len(), "ledger saved");
    Ok(())
}

pub fn insert_event(conn: &Connection, event: &Event) -> LedgerResult<()> {
    conn.execute(
        "INSERT INTO events (event_id, timestamp, event_type, entity_type, entity_id, data, actor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            event.data.to_string(),
            event.actor,
        ],
    )?;

    Ok(())
}

pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> LedgerResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map([entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_str: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// SQLITE REPOSITORY
// ============================================================================

pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (and create if needed) the ledger database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        setup_database(&conn).context("Failed to initialize database schema")?;
        Ok(SqliteRepository { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteRepository { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl EntryRepository for SqliteRepository {
    fn load(&self) -> Option<Vec<Entry>> {
        match get_all_entries(&self.conn) {
            Ok(entries) if entries.is_empty() => None,
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, "stored ledger unreadable, starting empty");
                None
            }
        }
    }

    fn save(&mut self, entries: &[Entry]) -> LedgerResult<()> {
        replace_all_entries(&mut self.conn, entries)
    }

    fn record_event(&mut self, event: &Event) -> LedgerResult<()> {
        insert_event(&self.conn, event)
    }
}

// ============================================================================
// CSV IMPORT / EXPORT
// ============================================================================

/// CSV row; only the candidate fields are mandatory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default)]
    id: String,
    amount: f64,
    #[serde(default)]
    currency: String,
    category: String,
    #[serde(default)]
    description: String,
    date: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    is_ai_generated: Option<bool>,
}

/// Load entries from a CSV file (header row required).
/// Rows with an unknown type are skipped with a warning; malformed dates are
/// kept and simply never land in a calendar bucket.
pub fn load_csv(csv_path: &Path) -> Result<Vec<Entry>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut entries = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let row: CsvRow = result.context("Failed to deserialize entry")?;

        let Some(kind) = EntryKind::parse(&row.kind) else {
            warn!(line = line + 2, kind = %row.kind, "skipping row with unknown type");
            continue;
        };

        let amount = row.amount.abs();
        let check = validate_amount(amount);
        if check.is_blocking() {
            warn!(line = line + 2, amount = %row.amount, "skipping row: {}", check.message);
            continue;
        }

        let timestamp = row
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        entries.push(Entry {
            id: row.id,
            amount,
            currency: if row.currency.is_empty() { "USD".to_string() } else { row.currency },
            category: row.category,
            description: row.description,
            date: row.date,
            timestamp,
            kind,
            is_ai_generated: row.is_ai_generated.unwrap_or(false),
        });
    }

    Ok(entries)
}

pub fn write_csv(csv_path: &Path, entries: &[Entry]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(csv_path).context("Failed to create CSV file")?;

    for entry in entries {
        wtr.serialize(entry).context("Failed to serialize entry")?;
    }

    wtr.flush()?;
    Ok(entries.len())
}

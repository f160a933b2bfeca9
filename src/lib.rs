// Garlic Archive - Core Library
// Ledger store, derived views, parsing collaborator; shared by the CLI/TUI and the API server

pub mod error;
pub mod entry;
pub mod heatmap;        // Calendar grids: WEEK / MONTH / YEAR buckets
pub mod scale;          // Color tiers against the view maximum
pub mod rollup;         // Category distribution, category table, trend series
pub mod stats;          // Summary scalars
pub mod snapshot;       // All derived views in one value
pub mod rules;          // Category tag / tone styling table
pub mod data_quality;   // Candidate checks before commit
pub mod store;          // Entry store + repository seam
pub mod db;             // SQLite repository, audit events, CSV
pub mod parser;         // Gemini parsing collaborator + intake
pub mod config;         // figment configuration

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use entry::{
    Entry, EntryCandidate, EntryKind, EntryPatch,
    parse_ledger_date, format_ledger_date,
};
pub use heatmap::{Bucket, ViewMode, YearGranularity, build_grid};
pub use scale::{Tier, bucket_tiers, max_abs, tier_for};
pub use rollup::{
    CategoryRow, CategoryShare, TrendPoint,
    category_table, distribution, trend_series,
};
pub use stats::SummaryStats;
pub use snapshot::{LedgerSnapshot, snapshot};
pub use rules::{CategoryRule, CategoryStyle, CategoryStyler, CategoryTag, Tone};
pub use data_quality::{QualityReport, Severity, ValidationResult, validate_candidate};
pub use store::{EntryFilter, EntryRepository, EntryStore, MemoryRepository};
pub use db::{Event, SqliteRepository, load_csv, write_csv};
pub use parser::{EntryParser, GeminiParser, Intake};
pub use config::LedgerConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

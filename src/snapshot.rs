// 📸 Ledger Snapshot - every derived view of the collection in one value
// Pure function of (entries, view, today); rebuilt on every change

use crate::entry::Entry;
use crate::heatmap::{build_grid, grid_total, Bucket, ViewMode, YearGranularity};
use crate::rollup::{category_table, distribution, trend_series, CategoryRow, CategoryShare, TrendPoint};
use crate::scale::{bucket_tiers, max_abs, Tier};
use crate::stats::SummaryStats;
use chrono::NaiveDate;
use serde::Serialize;

/// One heatmap cell together with its color tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(flatten)]
    pub bucket: Bucket,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub mode: ViewMode,
    pub granularity: YearGranularity,
    pub cells: Vec<Cell>,
    /// Scale maximum the tiers were computed against
    pub max_abs: f64,
    /// Net over the visible grid
    pub total: f64,
    pub distribution: Vec<CategoryShare>,
    pub table: Vec<CategoryRow>,
    pub trend: Vec<TrendPoint>,
    pub stats: SummaryStats,
}

impl LedgerSnapshot {
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.cells.iter().map(|c| &c.bucket)
    }
}

pub fn snapshot(
    entries: &[Entry],
    mode: ViewMode,
    granularity: YearGranularity,
    today: NaiveDate,
) -> LedgerSnapshot {
    let buckets = build_grid(entries, mode, granularity, today);
    let scale = max_abs(&buckets);
    let total = grid_total(&buckets);

    let tiers = bucket_tiers(&buckets);

    let cells = buckets
        .into_iter()
        .zip(tiers)
        .map(|(bucket, tier)| Cell { bucket, tier })
        .collect();

    LedgerSnapshot {
        mode,
        granularity,
        cells,
        max_abs: scale,
        total,
        distribution: distribution(entries),
        table: category_table(entries),
        trend: trend_series(entries),
        stats: SummaryStats::compute(entries),
    }
}

// 📅 Heatmap Grid - Temporal Bucketing
// Projects the flat entry list onto week / month / year calendar shapes.
// The shape depends only on `today`; entries only fill in values.

use crate::entry::{format_ledger_date, Entry};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// VIEW SELECTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewMode {
    Week,
    Month,
    Year,
}

impl ViewMode {
    pub fn next(&self) -> Self {
        match self {
            ViewMode::Week => ViewMode::Month,
            ViewMode::Month => ViewMode::Year,
            ViewMode::Year => ViewMode::Week,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ViewMode::Week => "WEEK",
            ViewMode::Month => "MONTH",
            ViewMode::Year => "YEAR",
        }
    }
}

/// How the YEAR view is sliced. Ignored by WEEK and MONTH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YearGranularity {
    ByMonth,
    ByWeek,
}

impl YearGranularity {
    pub fn toggle(&self) -> Self {
        match self {
            YearGranularity::ByMonth => YearGranularity::ByWeek,
            YearGranularity::ByWeek => YearGranularity::ByMonth,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            YearGranularity::ByMonth => "BY MONTH",
            YearGranularity::ByWeek => "BY WEEK",
        }
    }
}

// ============================================================================
// BUCKET
// ============================================================================

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    pub label: String,
    /// Net signed value (income minus expense)
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// 0 = Sunday .. 6 = Saturday; only set by YEAR/BY_WEEK
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    /// Layout placeholder, carries no data
    pub is_padding: bool,
}

impl Bucket {
    fn day(date: NaiveDate, value: f64) -> Self {
        Bucket {
            key: format_ledger_date(date),
            label: date.day().to_string(),
            value,
            date: Some(date),
            day_of_week: None,
            is_padding: false,
        }
    }

    fn padding(index: u32) -> Self {
        Bucket {
            key: format!("pad-{}", index),
            label: String::new(),
            value: 0.0,
            date: None,
            day_of_week: None,
            is_padding: true,
        }
    }
}

// ============================================================================
// GRID BUILDER
// ============================================================================

/// Build the bucket sequence for a view, anchored on `today`.
pub fn build_grid(
    entries: &[Entry],
    mode: ViewMode,
    granularity: YearGranularity,
    today: NaiveDate,
) -> Vec<Bucket> {
    let daily = daily_net(entries);

    match mode {
        ViewMode::Week => week_buckets(&daily, today),
        ViewMode::Month => month_buckets(&daily, today),
        ViewMode::Year => match granularity {
            YearGranularity::ByMonth => year_month_buckets(entries, today.year()),
            YearGranularity::ByWeek => year_day_buckets(&daily, today),
        },
    }
}

/// Net value per ledger date. Entries whose date does not parse are skipped.
pub fn daily_net(entries: &[Entry]) -> HashMap<NaiveDate, f64> {
    let mut map: HashMap<NaiveDate, f64> = HashMap::new();

    for entry in entries {
        if let Some(date) = entry.ledger_date() {
            *map.entry(date).or_insert(0.0) += entry.signed_amount();
        }
    }

    map
}

/// Monday of the ISO week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

pub fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.ordinal0() as i64)
}

/// Leading placeholders so day 1 lands in its weekday column (Monday = 0)
pub fn month_padding(date: NaiveDate) -> u32 {
    first_of_month(date).weekday().num_days_from_monday()
}

/// Every calendar day of the month containing `date`
pub fn days_of_month(date: NaiveDate) -> Vec<NaiveDate> {
    let month = date.month();
    first_of_month(date)
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// Every calendar day of the year containing `date` (365 or 366)
pub fn days_of_year(date: NaiveDate) -> Vec<NaiveDate> {
    let year = date.year();
    first_of_year(date)
        .iter_days()
        .take_while(|d| d.year() == year)
        .collect()
}

fn week_buckets(daily: &HashMap<NaiveDate, f64>, today: NaiveDate) -> Vec<Bucket> {
    start_of_week(today)
        .iter_days()
        .take(7)
        .map(|d| Bucket::day(d, daily.get(&d).copied().unwrap_or(0.0)))
        .collect()
}

fn month_buckets(daily: &HashMap<NaiveDate, f64>, today: NaiveDate) -> Vec<Bucket> {
    let padding = month_padding(today);

    let mut buckets: Vec<Bucket> = (0..padding).map(Bucket::padding).collect();
    buckets.extend(
        days_of_month(today)
            .into_iter()
            .map(|d| Bucket::day(d, daily.get(&d).copied().unwrap_or(0.0))),
    );

    buckets
}

fn year_month_buckets(entries: &[Entry], year: i32) -> Vec<Bucket> {
    let mut totals = [0.0_f64; 12];

    for entry in entries {
        if let Some(date) = entry.ledger_date() {
            if date.year() == year {
                totals[date.month0() as usize] += entry.signed_amount();
            }
        }
    }

    totals
        .iter()
        .enumerate()
        .map(|(i, total)| Bucket {
            key: format!("{}-{:02}", year, i + 1),
            label: (i + 1).to_string(),
            value: *total,
            date: None,
            day_of_week: None,
            is_padding: false,
        })
        .collect()
}

fn year_day_buckets(daily: &HashMap<NaiveDate, f64>, today: NaiveDate) -> Vec<Bucket> {
    days_of_year(today)
        .into_iter()
        .map(|d| {
            let mut bucket = Bucket::day(d, daily.get(&d).copied().unwrap_or(0.0));
            bucket.day_of_week = Some(d.weekday().num_days_from_sunday());
            bucket
        })
        .collect()
}

/// Net position of the whole view (padding contributes nothing)
pub fn grid_total(buckets: &[Bucket]) -> f64 {
    buckets
        .iter()
        .filter(|b| !b.is_padding)
        .map(|b| b.value)
        .sum()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryCandidate, EntryKind};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(amount: f64, kind: EntryKind, date: &str) -> Entry {
        Entry::from_candidate(EntryCandidate::new(amount, "Test", date, kind), false)
    }

    #[test]
    fn test_week_has_seven_days_monday_first() {
        // 2024-05-16 is a Thursday
        let buckets = build_grid(&[], ViewMode::Week, YearGranularity::ByMonth, ymd(2024, 5, 16));

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, Some(ymd(2024, 5, 13)));
        assert_eq!(buckets[6].date, Some(ymd(2024, 5, 19)));
        assert!(buckets.iter().all(|b| b.value == 0.0));
    }

    #[test]
    fn test_week_on_sunday_belongs_to_previous_monday() {
        // 2024-05-19 is a Sunday
        let buckets = build_grid(&[], ViewMode::Week, YearGranularity::ByMonth, ymd(2024, 5, 19));
        assert_eq!(buckets[0].date, Some(ymd(2024, 5, 13)));
    }

    #[test]
    fn test_week_sum_matches_entries_in_range() {
        let today = ymd(2024, 5, 16);
        let entries = vec![
            entry(100.0, EntryKind::Income, "2024-05-13"),
            entry(30.0, EntryKind::Expense, "2024-05-13"),
            entry(20.0, EntryKind::Expense, "2024-05-19"),
            entry(999.0, EntryKind::Income, "2024-05-12"), // previous week
            entry(999.0, EntryKind::Expense, "2024-05-20"), // next week
            entry(5.0, EntryKind::Expense, "not-a-date"),
        ];

        let buckets = build_grid(&entries, ViewMode::Week, YearGranularity::ByMonth, today);

        assert_eq!(buckets[0].value, 70.0);
        assert_eq!(buckets[6].value, -20.0);
        assert_eq!(grid_total(&buckets), 50.0);
    }

    #[test]
    fn test_month_padding_and_length() {
        // 2024-05-01 is a Wednesday -> 2 padding cells
        let buckets = build_grid(&[], ViewMode::Month, YearGranularity::ByMonth, ymd(2024, 5, 20));
        assert_eq!(buckets.len(), 2 + 31);
        assert!(buckets[0].is_padding && buckets[1].is_padding);
        assert_eq!(buckets[2].label, "1");

        // 2024-09-01 is a Sunday -> 6 padding cells
        let sept = build_grid(&[], ViewMode::Month, YearGranularity::ByMonth, ymd(2024, 9, 3));
        assert_eq!(month_padding(ymd(2024, 9, 3)), 6);
        assert_eq!(sept.len(), 6 + 30);

        // 2024-04-01 is a Monday -> no padding
        assert_eq!(month_padding(ymd(2024, 4, 15)), 0);

        // Leap February
        let feb = build_grid(&[], ViewMode::Month, YearGranularity::ByMonth, ymd(2024, 2, 10));
        assert_eq!(feb.iter().filter(|b| !b.is_padding).count(), 29);
    }

    #[test]
    fn test_month_excludes_other_months() {
        let entries = vec![
            entry(10.0, EntryKind::Expense, "2024-05-31"),
            entry(10.0, EntryKind::Expense, "2024-06-01"),
        ];
        let buckets = build_grid(&entries, ViewMode::Month, YearGranularity::ByMonth, ymd(2024, 5, 1));

        assert_eq!(grid_total(&buckets), -10.0);
        assert_eq!(buckets.last().unwrap().value, -10.0);
    }

    #[test]
    fn test_year_by_month_has_twelve_buckets() {
        let entries = vec![
            entry(5000.0, EntryKind::Income, "2024-01-01"),
            entry(50.0, EntryKind::Expense, "2024-01-15"),
            entry(70.0, EntryKind::Expense, "2024-12-31"),
            entry(1.0, EntryKind::Expense, "2023-12-31"),
        ];
        let buckets = build_grid(&entries, ViewMode::Year, YearGranularity::ByMonth, ymd(2024, 7, 1));

        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].value, 4950.0);
        assert_eq!(buckets[11].value, -70.0);
        assert_eq!(buckets[0].key, "2024-01");
        assert_eq!(buckets[11].label, "12");
    }

    #[test]
    fn test_year_by_week_covers_every_day() {
        let leap = build_grid(&[], ViewMode::Year, YearGranularity::ByWeek, ymd(2024, 3, 1));
        let common = build_grid(&[], ViewMode::Year, YearGranularity::ByWeek, ymd(2023, 3, 1));

        assert_eq!(leap.len(), 366);
        assert_eq!(common.len(), 365);

        // 2024-01-01 is a Monday, 2023-01-01 a Sunday
        assert_eq!(leap[0].day_of_week, Some(1));
        assert_eq!(common[0].day_of_week, Some(0));
        assert_eq!(leap[365].date, Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_empty_collection_keeps_shape() {
        let today = ymd(2025, 2, 14);
        for (mode, granularity) in [
            (ViewMode::Week, YearGranularity::ByMonth),
            (ViewMode::Month, YearGranularity::ByMonth),
            (ViewMode::Year, YearGranularity::ByMonth),
            (ViewMode::Year, YearGranularity::ByWeek),
        ] {
            let buckets = build_grid(&[], mode, granularity, today);
            assert!(!buckets.is_empty());
            assert!(buckets.iter().all(|b| b.value == 0.0));
        }
    }
}

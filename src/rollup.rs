// 📊 Category Rollups & Trend Series
// Distribution (expenses only), per-category table (all entries), daily trend

use crate::entry::{parse_ledger_date, Entry, EntryKind};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Number of distinct dates kept in the trend series
pub const TREND_WINDOW: usize = 15;

// ============================================================================
// DISTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub value: f64,
}

/// Expense total per category, in first-seen order.
/// Income never contributes; categories with no expense are omitted.
pub fn distribution(entries: &[Entry]) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries.iter().filter(|e| e.kind == EntryKind::Expense) {
        match index.get(entry.category.as_str()) {
            Some(&i) => shares[i].value += entry.amount,
            None => {
                index.insert(entry.category.as_str(), shares.len());
                shares.push(CategoryShare {
                    category: entry.category.clone(),
                    value: entry.amount,
                });
            }
        }
    }

    shares.retain(|s| s.value != 0.0);
    shares
}

// ============================================================================
// SUMMARY TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub category: String,
    pub count: usize,
    pub income_sum: f64,
    pub expense_sum: f64,
}

impl CategoryRow {
    /// Gross flow through the category, the table's sort key
    pub fn volume(&self) -> f64 {
        self.income_sum + self.expense_sum
    }
}

/// One row per distinct category over all entries, largest volume first.
/// Equal volumes keep first-seen order (stable sort).
pub fn category_table(entries: &[Entry]) -> Vec<CategoryRow> {
    let mut rows: Vec<CategoryRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let i = *index.entry(entry.category.as_str()).or_insert_with(|| {
            rows.push(CategoryRow {
                category: entry.category.clone(),
                count: 0,
                income_sum: 0.0,
                expense_sum: 0.0,
            });
            rows.len() - 1
        });

        let row = &mut rows[i];
        row.count += 1;
        match entry.kind {
            EntryKind::Income => row.income_sum += entry.amount,
            EntryKind::Expense => row.expense_sum += entry.amount,
        }
    }

    rows.sort_by(|a, b| b.volume().partial_cmp(&a.volume()).unwrap_or(Ordering::Equal));
    rows
}

// ============================================================================
// TREND SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Exact ledger date string of the group
    pub date: String,
    /// Short axis label, `MM/DD`
    pub label: String,
    pub income_sum: f64,
    pub expense_sum: f64,
}

/// Daily income/expense totals in chronological order, last 15 dates only.
pub fn trend_series(entries: &[Entry]) -> Vec<TrendPoint> {
    let mut groups: HashMap<&str, (f64, f64)> = HashMap::new();

    for entry in entries {
        let sums = groups.entry(entry.date.as_str()).or_insert((0.0, 0.0));
        match entry.kind {
            EntryKind::Income => sums.0 += entry.amount,
            EntryKind::Expense => sums.1 += entry.amount,
        }
    }

    let mut dates: Vec<&str> = groups.keys().copied().collect();
    dates.sort_by(|a, b| chronological(a, b));

    let skip = dates.len().saturating_sub(TREND_WINDOW);
    dates
        .into_iter()
        .skip(skip)
        .map(|date| {
            let (income_sum, expense_sum) = groups[date];
            TrendPoint {
                date: date.to_string(),
                label: axis_label(date),
                income_sum,
                expense_sum,
            }
        })
        .collect()
}

/// Valid dates in calendar order, then malformed strings lexically
fn chronological(a: &str, b: &str) -> Ordering {
    match (parse_ledger_date(a), parse_ledger_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// "2024-03-07" -> "03/07"; anything without a dash is returned as-is
fn axis_label(date: &str) -> String {
    match date.split_once('-') {
        Some((_, rest)) => rest.replace('-', "/"),
        None => date.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryCandidate;
    use pretty_assertions::assert_eq;

    fn entry(amount: f64, kind: EntryKind, category: &str, date: &str) -> Entry {
        Entry::from_candidate(EntryCandidate::new(amount, category, date, kind), true)
    }

    #[test]
    fn test_distribution_excludes_income() {
        let entries = vec![
            entry(5000.0, EntryKind::Income, "Salary", "2024-01-01"),
            entry(50.0, EntryKind::Expense, "Food", "2024-01-01"),
            entry(20.0, EntryKind::Expense, "Transport", "2024-01-02"),
            entry(30.0, EntryKind::Expense, "Food", "2024-01-03"),
            entry(10.0, EntryKind::Income, "Food", "2024-01-03"),
        ];

        let dist = distribution(&entries);
        let expense_total: f64 = entries.iter().filter(|e| e.is_expense()).map(|e| e.amount).sum();

        assert_eq!(
            dist,
            vec![
                CategoryShare { category: "Food".to_string(), value: 80.0 },
                CategoryShare { category: "Transport".to_string(), value: 20.0 },
            ]
        );
        assert_eq!(dist.iter().map(|s| s.value).sum::<f64>(), expense_total);
    }

    #[test]
    fn test_distribution_omits_zero_totals() {
        let entries = vec![entry(0.0, EntryKind::Expense, "Free", "2024-01-01")];
        assert!(distribution(&entries).is_empty());
    }

    #[test]
    fn test_category_grouping_is_case_sensitive() {
        let entries = vec![
            entry(10.0, EntryKind::Expense, "food", "2024-01-01"),
            entry(10.0, EntryKind::Expense, "Food", "2024-01-01"),
        ];
        assert_eq!(distribution(&entries).len(), 2);
        assert_eq!(category_table(&entries).len(), 2);
    }

    #[test]
    fn test_category_table_sorted_by_volume() {
        let entries = vec![
            entry(5.0, EntryKind::Expense, "Coffee", "2024-01-01"),
            entry(100.0, EntryKind::Income, "Freelance", "2024-01-01"),
            entry(60.0, EntryKind::Expense, "Food", "2024-01-02"),
            entry(50.0, EntryKind::Income, "Food", "2024-01-02"),
            entry(5.0, EntryKind::Expense, "Tea", "2024-01-02"),
        ];

        let table = category_table(&entries);
        let order: Vec<&str> = table.iter().map(|r| r.category.as_str()).collect();

        // Coffee and Tea tie at 5.0 and keep first-seen order
        assert_eq!(order, vec!["Food", "Freelance", "Coffee", "Tea"]);
        assert_eq!(table[0].count, 2);
        assert_eq!(table[0].income_sum, 50.0);
        assert_eq!(table[0].expense_sum, 60.0);
    }

    #[test]
    fn test_trend_sorted_by_date_not_insertion() {
        let entries = vec![
            entry(10.0, EntryKind::Expense, "A", "2024-03-05"),
            entry(20.0, EntryKind::Income, "A", "2024-03-01"),
            entry(5.0, EntryKind::Expense, "A", "2024-03-05"),
        ];

        let trend = trend_series(&entries);
        assert_eq!(
            trend,
            vec![
                TrendPoint {
                    date: "2024-03-01".to_string(),
                    label: "03/01".to_string(),
                    income_sum: 20.0,
                    expense_sum: 0.0,
                },
                TrendPoint {
                    date: "2024-03-05".to_string(),
                    label: "03/05".to_string(),
                    income_sum: 0.0,
                    expense_sum: 15.0,
                },
            ]
        );
    }

    #[test]
    fn test_trend_keeps_last_fifteen_dates() {
        // 30 distinct dates, inserted newest first
        let entries: Vec<Entry> = (1..=30)
            .rev()
            .map(|d| entry(d as f64, EntryKind::Expense, "A", &format!("2024-04-{:02}", d)))
            .collect();

        let trend = trend_series(&entries);

        assert_eq!(trend.len(), 15);
        assert_eq!(trend.first().unwrap().date, "2024-04-16");
        assert_eq!(trend.last().unwrap().date, "2024-04-30");
        assert!(trend.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_trend_malformed_dates_sort_last() {
        let entries = vec![
            entry(1.0, EntryKind::Expense, "A", "someday"),
            entry(1.0, EntryKind::Expense, "A", "2024-01-01"),
        ];
        let trend = trend_series(&entries);
        assert_eq!(trend[0].date, "2024-01-01");
        assert_eq!(trend[1].label, "someday");
    }
}

// 🔢 Summary Statistics - scalars recomputed from the full collection on demand

use crate::entry::Entry;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Total expense / number of distinct active dates (floor 1)
    pub average_daily: f64,
    /// Largest single amount, 0 when empty
    pub peak_flow: f64,
    /// Share of income entries, in percent
    pub positive_frequency: f64,
    pub distinct_active_dates: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub net: f64,
    pub entry_count: usize,
}

impl SummaryStats {
    pub fn compute(entries: &[Entry]) -> Self {
        let dates: HashSet<&str> = entries.iter().map(|e| e.date.as_str()).collect();

        let mut stats = SummaryStats {
            distinct_active_dates: dates.len(),
            entry_count: entries.len(),
            ..Default::default()
        };

        let mut income_count = 0usize;
        for entry in entries {
            if entry.is_income() {
                income_count += 1;
                stats.total_income += entry.amount;
            } else {
                stats.total_expense += entry.amount;
            }
            stats.peak_flow = stats.peak_flow.max(entry.amount);
        }

        stats.net = stats.total_income - stats.total_expense;
        stats.average_daily = stats.total_expense / dates.len().max(1) as f64;
        stats.positive_frequency = income_count as f64 / entries.len().max(1) as f64 * 100.0;

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryCandidate, EntryKind};

    fn entry(amount: f64, kind: EntryKind, date: &str) -> Entry {
        Entry::from_candidate(EntryCandidate::new(amount, "Misc", date, kind), true)
    }

    #[test]
    fn test_salary_and_coffee_example() {
        let entries = vec![
            entry(5000.0, EntryKind::Income, "2024-01-01"),
            entry(50.0, EntryKind::Expense, "2024-01-01"),
        ];

        let stats = SummaryStats::compute(&entries);

        assert_eq!(stats.average_daily, 50.0);
        assert_eq!(stats.peak_flow, 5000.0);
        assert_eq!(stats.positive_frequency, 50.0);
        assert_eq!(stats.distinct_active_dates, 1);
        assert_eq!(stats.net, 4950.0);
    }

    #[test]
    fn test_empty_collection() {
        let stats = SummaryStats::compute(&[]);

        assert_eq!(stats.average_daily, 0.0);
        assert_eq!(stats.peak_flow, 0.0);
        assert_eq!(stats.positive_frequency, 0.0);
        assert_eq!(stats.distinct_active_dates, 0);
    }

    #[test]
    fn test_average_over_distinct_dates() {
        let entries = vec![
            entry(30.0, EntryKind::Expense, "2024-01-01"),
            entry(30.0, EntryKind::Expense, "2024-01-02"),
            entry(30.0, EntryKind::Expense, "2024-01-02"),
            entry(1.0, EntryKind::Income, "2024-01-03"),
        ];

        let stats = SummaryStats::compute(&entries);

        assert_eq!(stats.distinct_active_dates, 3);
        assert_eq!(stats.average_daily, 30.0);
        assert_eq!(stats.positive_frequency, 25.0);
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One generated trip, recorded in the session history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub destination: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub daily_budget_per_person: f64,
    pub traveler_count: u32,
    pub estimated_cost: f64,
}

/// Aggregates over the session history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryStats {
    pub total_trips: usize,
    pub average_duration: f64,
    pub duration_std_dev: f64,
    pub average_cost: f64,
    pub cost_std_dev: f64,
    pub most_popular_destination: String,
}

impl HistoryStats {
    /// Compute statistics, or `None` for an empty history.
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let durations: Vec<f64> = entries.iter().map(|e| f64::from(e.duration_days)).collect();
        let costs: Vec<f64> = entries.iter().map(|e| e.estimated_cost).collect();

        Some(Self {
            total_trips: entries.len(),
            average_duration: mean(&durations),
            duration_std_dev: sample_std_dev(&durations),
            average_cost: mean(&costs),
            cost_std_dev: sample_std_dev(&costs),
            most_popular_destination: most_frequent(entries),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

// Ties go to the alphabetically smallest destination.
fn most_frequent(entries: &[HistoryEntry]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.destination.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(destination: &str, days: u32, cost: f64) -> HistoryEntry {
        HistoryEntry {
            destination: destination.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            duration_days: days,
            daily_budget_per_person: 100.0,
            traveler_count: 1,
            estimated_cost: cost,
        }
    }

    #[test]
    fn test_empty_history_has_no_stats() {
        assert!(HistoryStats::from_entries(&[]).is_none());
    }

    #[test]
    fn test_single_entry_stats() {
        let stats = HistoryStats::from_entries(&[entry("Tokyo", 5, 2500.0)]).unwrap();
        assert_eq!(stats.total_trips, 1);
        assert_eq!(stats.average_duration, 5.0);
        assert_eq!(stats.duration_std_dev, 0.0);
        assert_eq!(stats.most_popular_destination, "Tokyo");
    }

    #[test]
    fn test_stats_over_several_entries() {
        let entries = vec![
            entry("Lisbon", 2, 400.0),
            entry("Tokyo", 4, 800.0),
            entry("Tokyo", 6, 1200.0),
        ];
        let stats = HistoryStats::from_entries(&entries).unwrap();
        assert_eq!(stats.total_trips, 3);
        assert_eq!(stats.average_duration, 4.0);
        assert_eq!(stats.duration_std_dev, 2.0);
        assert_eq!(stats.average_cost, 800.0);
        assert_eq!(stats.most_popular_destination, "Tokyo");
    }

    #[test]
    fn test_mode_tie_prefers_alphabetical_order() {
        let entries = vec![entry("Paris", 2, 100.0), entry("Oslo", 2, 100.0)];
        let stats = HistoryStats::from_entries(&entries).unwrap();
        assert_eq!(stats.most_popular_destination, "Oslo");

        let entries = vec![
            entry("Rome", 2, 100.0),
            entry("Paris", 2, 100.0),
            entry("Rome", 3, 100.0),
        ];
        let stats = HistoryStats::from_entries(&entries).unwrap();
        assert_eq!(stats.most_popular_destination, "Rome");
    }
}

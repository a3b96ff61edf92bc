use super::chat::ChatTurn;
use crate::types::history::{HistoryEntry, HistoryStats};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Explicit per-session state: trip history and chat transcript.
///
/// Created when a session starts and passed by `&mut` to every operation
/// that records something. Both lists are append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    history: Vec<HistoryEntry>,
    transcript: Vec<ChatTurn>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generated trip to the history
    pub fn record_trip(&mut self, entry: HistoryEntry) {
        info!(
            target: "trip_planner::history",
            destination = %entry.destination,
            estimated_cost = entry.estimated_cost,
            "recorded trip"
        );
        self.history.push(entry);
    }

    /// Trips in the order they were generated
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_trip(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Aggregates over the history, `None` until a trip is recorded
    pub fn statistics(&self) -> Option<HistoryStats> {
        HistoryStats::from_entries(&self.history)
    }

    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.transcript.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(destination: &str) -> HistoryEntry {
        HistoryEntry {
            destination: destination.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            duration_days: 3,
            daily_budget_per_person: 100.0,
            traveler_count: 2,
            estimated_cost: 600.0,
        }
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = AppState::new();
        assert!(state.is_empty());
        assert!(state.statistics().is_none());
    }

    #[test]
    fn test_history_keeps_insertion_order() {
        let mut state = AppState::new();
        state.record_trip(entry("Kyoto"));
        state.record_trip(entry("Lima"));
        let names: Vec<&str> = state.history().iter().map(|e| e.destination.as_str()).collect();
        assert_eq!(names, vec!["Kyoto", "Lima"]);
        assert_eq!(state.last_trip().unwrap().destination, "Lima");
        assert_eq!(state.statistics().unwrap().total_trips, 2);
    }

    #[test]
    fn test_state_serializes_history() {
        let mut state = AppState::new();
        state.record_trip(entry("Kyoto"));
        state.push_turn(ChatTurn::Traveler {
            content: "hi".to_string(),
        });
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["history"][0]["destination"], "Kyoto");
        assert_eq!(json["transcript"][0]["role"], "traveler");
    }
}

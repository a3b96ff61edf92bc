use crate::{render::emoji::strip_emoji, types::trip::TripRequest};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

const MAX_TITLE_CHARS: usize = 80;

/// A timed itinerary entry to post to the calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timezone: String,
}

impl CalendarEvent {
    /// Request body for the Google Calendar events endpoint
    pub fn to_request_body(&self) -> Value {
        json!({
            "summary": self.title,
            "description": self.description,
            "start": {
                "dateTime": self.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": self.timezone,
            },
            "end": {
                "dateTime": self.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": self.timezone,
            },
        })
    }
}

/// Part of the day an itinerary bullet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySlot {
    Morning,
    Afternoon,
    Evening,
}

impl DaySlot {
    fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "morning" => Some(DaySlot::Morning),
            "afternoon" => Some(DaySlot::Afternoon),
            "evening" => Some(DaySlot::Evening),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DaySlot::Morning => "Morning",
            DaySlot::Afternoon => "Afternoon",
            DaySlot::Evening => "Evening",
        }
    }

    /// Start and end hour of the slot
    pub fn hours(&self) -> (u32, u32) {
        match self {
            DaySlot::Morning => (9, 12),
            DaySlot::Afternoon => (13, 17),
            DaySlot::Evening => (18, 21),
        }
    }
}

fn day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^day\s+(\d{1,3})\b").expect("day pattern is valid"))
}

fn slot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(morning|afternoon|evening)\s*[:\-–]\s*(.+)$")
            .expect("slot pattern is valid")
    })
}

// Drop heading/bullet markers and bold delimiters so only the words remain.
fn clean_line(line: &str) -> String {
    let stripped = strip_emoji(line);
    stripped
        .trim_start_matches(|c: char| c == '#' || c == '-' || c == '*' || c.is_whitespace())
        .replace("**", "")
        .trim()
        .to_string()
}

fn truncate_title(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_TITLE_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

/// Pull timed events out of the itinerary text.
///
/// A line starting with "Day N" selects the trip day; following
/// "Morning:", "Afternoon:" and "Evening:" lines become events on that
/// day's date until the next `#` section heading. Days outside the trip are
/// ignored.
pub fn extract_events(plan_text: &str, trip: &TripRequest, timezone: &str) -> Vec<CalendarEvent> {
    let duration = trip.duration_days();
    let mut current_day: Option<u32> = None;
    let mut events = Vec::new();

    for line in plan_text.lines() {
        // A new section ends the current itinerary day.
        if line.trim_start().starts_with('#') {
            current_day = None;
        }

        let cleaned = clean_line(line);
        if cleaned.is_empty() {
            continue;
        }

        if let Some(caps) = day_pattern().captures(&cleaned) {
            current_day = caps[1]
                .parse::<u32>()
                .ok()
                .filter(|day| (1..=duration).contains(day));
            continue;
        }

        let Some(day) = current_day else {
            continue;
        };
        let Some(caps) = slot_pattern().captures(&cleaned) else {
            continue;
        };
        let Some(slot) = DaySlot::parse(&caps[1]) else {
            continue;
        };

        let activity = caps[2].trim();
        let date = trip.start_date + Duration::days(i64::from(day - 1));
        let (start_hour, end_hour) = slot.hours();
        let (Some(start), Some(end)) = (
            NaiveTime::from_hms_opt(start_hour, 0, 0),
            NaiveTime::from_hms_opt(end_hour, 0, 0),
        ) else {
            continue;
        };

        events.push(CalendarEvent {
            title: truncate_title(&format!("Day {} {}: {}", day, slot.label(), activity)),
            description: activity.to_string(),
            start: date.and_time(start),
            end: date.and_time(end),
            timezone: timezone.to_string(),
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trip() -> TripRequest {
        TripRequest {
            starting_location: "Paris".to_string(),
            destinations: vec!["Lyon".to_string()],
            return_city: "Paris".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 11).unwrap(),
            daily_budget_per_person: 120.0,
            traveler_count: 1,
            interests: vec![],
            travel_styles: vec![],
            language: "English".to_string(),
        }
    }

    #[test]
    fn test_extract_events_from_itinerary() {
        let plan = "# Day-by-Day Itinerary\n\
            **Day 1 - Thursday, July 10, 2025 - Lyon**\n\
            - 🌅 Morning: Vieux Lyon walking tour\n\
            - Afternoon: **Musée des Confluences**\n\
            - Daily total: $110\n\
            **Day 2 - Friday, July 11, 2025 - Lyon**\n\
            - Evening: Dinner at a bouchon\n";

        let events = extract_events(plan, &trip(), "Europe/Paris");
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].title, "Day 1 Morning: Vieux Lyon walking tour");
        assert_eq!(
            events[0].start,
            NaiveDate::from_ymd_opt(2025, 7, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
        assert_eq!(events[1].description, "Musée des Confluences");
        assert_eq!(events[2].start.date(), NaiveDate::from_ymd_opt(2025, 7, 11).unwrap());
        assert_eq!(events[2].end.format("%H:%M").to_string(), "21:00");
        assert_eq!(events[2].timezone, "Europe/Paris");
    }

    #[test]
    fn test_days_outside_trip_are_ignored() {
        let plan = "Day 9\n- Morning: nothing\nMorning: before any day";
        assert!(extract_events(plan, &trip(), "UTC").is_empty());
    }

    #[test]
    fn test_later_sections_do_not_inherit_the_last_day() {
        let plan = "# Day-by-Day Itinerary\n\
            **Day 2 - Lyon**\n\
            - Morning: Old town walk\n\
            # Return Logistics\n\
            - Morning: Train back to Paris departs 08:15\n\
            # Must-Try Local Cuisine\n\
            - Evening: Quenelles at a bouchon\n";

        let events = extract_events(plan, &trip(), "UTC");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Day 2 Morning: Old town walk");
    }

    #[test]
    fn test_request_body_shape() {
        let events = extract_events("Day 1\nMorning: Museum", &trip(), "UTC");
        let body = events[0].to_request_body();
        assert_eq!(body["summary"], "Day 1 Morning: Museum");
        assert_eq!(body["start"]["dateTime"], "2025-07-10T09:00:00");
        assert_eq!(body["end"]["timeZone"], "UTC");
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let long = "a".repeat(200);
        let title = truncate_title(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with('…'));
    }
}

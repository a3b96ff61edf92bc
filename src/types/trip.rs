use crate::error::{Result, TravelError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of stops a single trip may route through.
pub const MAX_DESTINATIONS: usize = 5;

/// Longest trip, in days, a single plan may cover.
pub const MAX_TRIP_DAYS: u32 = 30;

/// Trip parameters collected from the user for one plan generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRequest {
    /// City the traveler departs from
    pub starting_location: String,
    /// Ordered stops on the route (1 to 5)
    pub destinations: Vec<String>,
    /// City the traveler returns to at the end of the trip
    pub return_city: String,
    /// First day of the trip
    pub start_date: NaiveDate,
    /// Last day of the trip (inclusive)
    pub end_date: NaiveDate,
    /// Amount one traveler intends to spend per day
    pub daily_budget_per_person: f64,
    /// Number of people travelling together
    pub traveler_count: u32,
    /// Interests used to tailor activities (e.g. "Food & Cuisine")
    #[serde(default)]
    pub interests: Vec<String>,
    /// Travel styles such as "Adventure" or "Relaxation"
    #[serde(default)]
    pub travel_styles: Vec<String>,
    /// Language the plan should be written in
    pub language: String,
}

impl TripRequest {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.starting_location.trim().is_empty() {
            return Err(TravelError::InvalidParameter(
                "Starting location is required".to_string(),
            ));
        }
        if self.return_city.trim().is_empty() {
            return Err(TravelError::InvalidParameter(
                "Return city is required".to_string(),
            ));
        }
        if self.destinations.is_empty() {
            return Err(TravelError::InvalidParameter(
                "At least one destination is required".to_string(),
            ));
        }
        if self.destinations.len() > MAX_DESTINATIONS {
            return Err(TravelError::InvalidParameter(format!(
                "At most {} destinations are supported, got {}",
                MAX_DESTINATIONS,
                self.destinations.len()
            )));
        }
        if self.destinations.iter().any(|d| d.trim().is_empty()) {
            return Err(TravelError::InvalidParameter(
                "Destination names cannot be blank".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(TravelError::InvalidParameter(format!(
                "End date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.duration_days() > MAX_TRIP_DAYS {
            return Err(TravelError::InvalidParameter(format!(
                "Trips can be at most {} days long, got {}",
                MAX_TRIP_DAYS,
                self.duration_days()
            )));
        }
        if !self.daily_budget_per_person.is_finite() || self.daily_budget_per_person < 0.0 {
            return Err(TravelError::InvalidParameter(
                "Daily budget must be a non-negative number".to_string(),
            ));
        }
        if self.traveler_count == 0 {
            return Err(TravelError::InvalidParameter(
                "Traveler count must be at least 1".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(TravelError::InvalidParameter(
                "Language is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Inclusive number of calendar days covered by the trip.
    pub fn duration_days(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days() + 1;
        days.max(0) as u32
    }

    /// Every calendar day of the trip in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|day| *day <= self.end_date)
            .collect()
    }

    /// Destinations joined for headers and summaries, e.g. "Rome, Florence".
    pub fn destination_summary(&self) -> String {
        self.destinations
            .iter()
            .map(|d| d.trim())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Full route including the start and return cities.
    pub fn route(&self) -> String {
        let mut stops = vec![self.starting_location.trim()];
        stops.extend(self.destinations.iter().map(|d| d.trim()));
        stops.push(self.return_city.trim());
        stops.join(" -> ")
    }

    /// Pair every trip date with the destination the traveler is in that day.
    pub fn day_plan(&self) -> Vec<(NaiveDate, String)> {
        let allocation = allocate_days(self.duration_days(), self.destinations.len());
        let mut stops = Vec::with_capacity(self.duration_days() as usize);
        for (destination, days) in self.destinations.iter().zip(allocation) {
            for _ in 0..days {
                stops.push(destination.trim().to_string());
            }
        }
        self.dates().into_iter().zip(stops).collect()
    }
}

/// Spread `duration` days across `stops` destinations in route order.
///
/// Earlier stops take the remainder, so `allocate_days(7, 3)` is `[3, 2, 2]`.
pub fn allocate_days(duration: u32, stops: usize) -> Vec<u32> {
    if stops == 0 {
        return Vec::new();
    }
    let stops_u32 = stops as u32;
    let base = duration / stops_u32;
    let remainder = duration % stops_u32;
    (0..stops_u32)
        .map(|idx| base + u32::from(idx < remainder))
        .collect()
}

/// Parse a user-entered budget such as "1,000" or " 250.50 ".
pub fn parse_budget(input: &str) -> Result<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    let value: f64 = cleaned.parse().map_err(|_| {
        TravelError::InvalidParameter(format!("Budget '{}' is not a valid number", input.trim()))
    })?;

    if !value.is_finite() || value < 0.0 {
        return Err(TravelError::InvalidParameter(
            "Budget must be a non-negative number".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trip() -> TripRequest {
        TripRequest {
            starting_location: "Berlin".to_string(),
            destinations: vec!["Rome".to_string(), "Florence".to_string()],
            return_city: "Berlin".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
            daily_budget_per_person: 150.0,
            traveler_count: 2,
            interests: vec!["Art & Museums".to_string()],
            travel_styles: vec![],
            language: "English".to_string(),
        }
    }

    #[test]
    fn test_duration_is_inclusive() {
        let trip = sample_trip();
        assert_eq!(trip.duration_days(), 5);
        assert_eq!(trip.dates().len(), 5);
        assert_eq!(trip.dates()[4], trip.end_date);
    }

    #[test]
    fn test_single_day_trip() {
        let mut trip = sample_trip();
        trip.end_date = trip.start_date;
        assert_eq!(trip.duration_days(), 1);
        assert!(trip.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut trip = sample_trip();
        trip.end_date = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        assert!(matches!(
            trip.validate(),
            Err(TravelError::InvalidParameter(_))
        ));

        let mut trip = sample_trip();
        trip.traveler_count = 0;
        assert!(trip.validate().is_err());

        let mut trip = sample_trip();
        trip.daily_budget_per_person = -1.0;
        assert!(trip.validate().is_err());

        let mut trip = sample_trip();
        trip.destinations = vec!["A", "B", "C", "D", "E", "F"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(trip.validate().is_err());

        let mut trip = sample_trip();
        trip.destinations.clear();
        assert!(trip.validate().is_err());

        let mut trip = sample_trip();
        trip.starting_location = "   ".to_string();
        assert!(trip.validate().is_err());
    }

    #[test]
    fn test_trip_length_is_capped() {
        let mut trip = sample_trip();
        trip.end_date = trip.start_date + chrono::Duration::days(i64::from(MAX_TRIP_DAYS) - 1);
        assert!(trip.validate().is_ok());

        trip.end_date = trip.end_date + chrono::Duration::days(1);
        match trip.validate() {
            Err(TravelError::InvalidParameter(msg)) => assert!(msg.contains("at most 30 days")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_allocate_days() {
        assert_eq!(allocate_days(7, 3), vec![3, 2, 2]);
        assert_eq!(allocate_days(2, 3), vec![1, 1, 0]);
        assert_eq!(allocate_days(4, 1), vec![4]);
        assert!(allocate_days(4, 0).is_empty());
    }

    #[test]
    fn test_day_plan_follows_route() {
        let trip = sample_trip();
        let plan = trip.day_plan();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].1, "Rome");
        assert_eq!(plan[2].1, "Rome");
        assert_eq!(plan[3].1, "Florence");
    }

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("1,000").unwrap(), 1000.0);
        assert_eq!(parse_budget(" $250.50 ").unwrap(), 250.5);
        assert!(parse_budget("lots").is_err());
        assert!(parse_budget("-5").is_err());
    }

    #[test]
    fn test_route_and_summary() {
        let trip = sample_trip();
        assert_eq!(trip.destination_summary(), "Rome, Florence");
        assert_eq!(trip.route(), "Berlin -> Rome -> Florence -> Berlin");
    }
}

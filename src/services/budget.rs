use crate::{
    error::{Result, TravelError},
    types::budget::{BudgetBreakdown, BudgetCheck, CategoryAmounts},
};
use regex::Regex;
use std::sync::OnceLock;

pub const ACCOMMODATION_SHARE: f64 = 0.40;
pub const FOOD_SHARE: f64 = 0.20;
pub const ACTIVITIES_SHARE: f64 = 0.20;
pub const TRANSPORTATION_SHARE: f64 = 0.20;

/// Relative difference accepted between the stated and computed totals.
pub const STATED_TOTAL_TOLERANCE: f64 = 0.10;

/// Round half away from zero to two decimal places.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Split a daily budget into the fixed category shares and scale it by
/// group size and trip length.
pub fn estimate(
    duration_days: u32,
    daily_budget_per_person: f64,
    traveler_count: u32,
) -> Result<BudgetBreakdown> {
    if duration_days == 0 {
        return Err(TravelError::InvalidParameter(
            "Duration must be at least one day".to_string(),
        ));
    }
    if traveler_count == 0 {
        return Err(TravelError::InvalidParameter(
            "Traveler count must be at least 1".to_string(),
        ));
    }
    if !daily_budget_per_person.is_finite() || daily_budget_per_person < 0.0 {
        return Err(TravelError::InvalidParameter(
            "Daily budget must be a non-negative number".to_string(),
        ));
    }

    let per_person_daily = CategoryAmounts {
        accommodation: round_currency(daily_budget_per_person * ACCOMMODATION_SHARE),
        food: round_currency(daily_budget_per_person * FOOD_SHARE),
        activities: round_currency(daily_budget_per_person * ACTIVITIES_SHARE),
        transportation: round_currency(daily_budget_per_person * TRANSPORTATION_SHARE),
    };

    let travelers = f64::from(traveler_count);
    let total_breakdown = CategoryAmounts {
        accommodation: round_currency(per_person_daily.accommodation * travelers),
        food: round_currency(per_person_daily.food * travelers),
        activities: round_currency(per_person_daily.activities * travelers),
        transportation: round_currency(per_person_daily.transportation * travelers),
    };

    let daily_total_for_group = daily_budget_per_person * travelers;
    let total_estimate = daily_total_for_group * f64::from(duration_days);

    Ok(BudgetBreakdown {
        duration_days,
        traveler_count,
        daily_budget_per_person,
        daily_total_for_group,
        total_estimate,
        per_person_daily,
        total_breakdown,
    })
}

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[$€£¥]\s?([0-9][0-9,]*(?:\.[0-9]+)?)").expect("amount pattern is valid")
    })
}

/// Compare the total the model states in its cost section with the computed
/// estimate. Returns `None` when no stated total can be found.
///
/// Only the text after a "Cost" heading is searched when one exists; the last
/// line mentioning "total" with a currency figure wins.
pub fn check_stated_total(plan_text: &str, breakdown: &BudgetBreakdown) -> Option<BudgetCheck> {
    let cost_section = plan_text
        .match_indices('#')
        .map(|(idx, _)| &plan_text[idx..])
        .find(|rest| {
            rest.trim_start_matches('#')
                .trim_start()
                .to_lowercase()
                .starts_with("cost")
        })
        .unwrap_or(plan_text);

    let stated = cost_section
        .lines()
        .filter(|line| line.to_lowercase().contains("total"))
        .filter_map(|line| {
            amount_pattern()
                .captures_iter(line)
                .last()
                .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
        })
        .last()?;

    let expected = breakdown.total_estimate;
    let check = BudgetCheck {
        stated,
        expected,
        within_tolerance: false,
    };
    let within_tolerance = check.deviation().abs() <= STATED_TOTAL_TOLERANCE;
    Some(BudgetCheck {
        within_tolerance,
        ..check
    })
}

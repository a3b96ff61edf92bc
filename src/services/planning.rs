use crate::{
    core::chat::ChatTurn,
    types::{budget::BudgetBreakdown, trip::TripRequest},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of days enumerated in a single itinerary prompt.
pub const ITINERARY_DAYS_PER_PROMPT: usize = 4;

/// Number of previous chat turns replayed into a chat prompt.
pub const CHAT_CONTEXT_TURNS: usize = 6;

const CHAT_PERSONA: &str = "You are a friendly, well-travelled trip assistant. Answer travel \
questions concisely and practically, mention costs with a currency symbol, and say so when \
you are unsure instead of inventing details.";

/// Independent parts of an itinerary, each generated from its own prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Overview,
    Weather,
    Departure,
    Itinerary,
    Return,
    Accommodation,
    Cuisine,
    Costs,
    Transportation,
    Customs,
    Safety,
    Packing,
}

impl SectionKind {
    /// Sections generated for every plan, in output order
    pub const CORE: [SectionKind; 8] = [
        SectionKind::Overview,
        SectionKind::Weather,
        SectionKind::Departure,
        SectionKind::Itinerary,
        SectionKind::Return,
        SectionKind::Accommodation,
        SectionKind::Cuisine,
        SectionKind::Costs,
    ];

    /// Core sections plus the optional travel-guide extras
    pub const ALL: [SectionKind; 12] = [
        SectionKind::Overview,
        SectionKind::Weather,
        SectionKind::Departure,
        SectionKind::Itinerary,
        SectionKind::Return,
        SectionKind::Accommodation,
        SectionKind::Transportation,
        SectionKind::Cuisine,
        SectionKind::Customs,
        SectionKind::Safety,
        SectionKind::Packing,
        SectionKind::Costs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Overview => "Overview",
            SectionKind::Weather => "Weather and Best Time to Visit",
            SectionKind::Departure => "Departure Logistics",
            SectionKind::Itinerary => "Day-by-Day Itinerary",
            SectionKind::Return => "Return Logistics",
            SectionKind::Accommodation => "Accommodation Recommendations",
            SectionKind::Cuisine => "Must-Try Local Cuisine",
            SectionKind::Costs => "Cost Breakdown",
            SectionKind::Transportation => "Local Transportation",
            SectionKind::Customs => "Local Customs & Etiquette",
            SectionKind::Safety => "Safety Tips",
            SectionKind::Packing => "Packing Recommendations",
        }
    }
}

/// One section-scoped prompt ready to send to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPrompt {
    pub kind: SectionKind,
    pub label: String,
    pub prompt: String,
}

/// Build the prompts for the core sections of a plan.
pub fn build_prompts(trip: &TripRequest, budget: &BudgetBreakdown) -> Vec<SectionPrompt> {
    build_section_prompts(trip, budget, &SectionKind::CORE)
}

/// Build prompts for an explicit list of sections, preserving its order.
///
/// The itinerary expands into one prompt per block of
/// [`ITINERARY_DAYS_PER_PROMPT`] days.
pub fn build_section_prompts(
    trip: &TripRequest,
    budget: &BudgetBreakdown,
    sections: &[SectionKind],
) -> Vec<SectionPrompt> {
    let context = trip_context(trip, budget);
    let mut prompts = Vec::new();

    for kind in sections {
        match kind {
            SectionKind::Itinerary => prompts.extend(itinerary_prompts(trip, budget, &context)),
            other => prompts.push(SectionPrompt {
                kind: *other,
                label: other.label().to_string(),
                prompt: format!(
                    "{}\n\n{}\n\n{}",
                    context,
                    section_instructions(*other, trip, budget),
                    FORMATTING_RULES
                ),
            }),
        }
    }

    prompts
}

const FORMATTING_RULES: &str = "Formatting rules:\n\
- Put the currency symbol ($) directly before every monetary figure.\n\
- Use \"-\" at the start of a line for bullet points and **bold** for sub-headings.\n\
- Never start a line with \"#\"; the section heading is added for you.\n\
- Do not use single-asterisk or underscore italics.\n\
- Only write this section; other parts of the plan are produced separately.";

fn trip_context(trip: &TripRequest, budget: &BudgetBreakdown) -> String {
    let interests = if trip.interests.is_empty() {
        "All".to_string()
    } else {
        trip.interests.join(", ")
    };
    let styles = if trip.travel_styles.is_empty() {
        "Flexible".to_string()
    } else {
        trip.travel_styles.join(", ")
    };

    format!(
        "You are planning a trip.\n\
         Route: {route}\n\
         Dates: {start} to {end} ({days} days)\n\
         Travelers: {travelers}\n\
         Interests: {interests}\n\
         Travel styles: {styles}\n\
         Daily budget: {per_person} per person, {group} per day for the group, {total} for the whole trip\n\
         Write the answer in {language}.",
        route = trip.route(),
        start = long_date(trip.start_date),
        end = long_date(trip.end_date),
        days = budget.duration_days,
        travelers = budget.traveler_count,
        interests = interests,
        styles = styles,
        per_person = format_money(budget.daily_budget_per_person),
        group = format_money(budget.daily_total_for_group),
        total = format_money(budget.total_estimate),
        language = trip.language.trim(),
    )
}

fn section_instructions(kind: SectionKind, trip: &TripRequest, budget: &BudgetBreakdown) -> String {
    let destinations = trip.destination_summary();
    match kind {
        SectionKind::Overview => format!(
            "Write a short overview of {} explaining why the route suits the listed interests. \
             Keep it to two paragraphs and a few bullet highlights.",
            destinations
        ),
        SectionKind::Weather => format!(
            "Describe the expected weather in {} between {} and {}, and the generally best \
             time to visit. Mention any festivals or special events during these dates.",
            destinations,
            long_date(trip.start_date),
            long_date(trip.end_date)
        ),
        SectionKind::Departure => format!(
            "Describe how to get from {} to {} on {}: transport options, typical travel time, \
             approximate fares for {} travelers and check-in tips.",
            trip.starting_location.trim(),
            trip.destinations
                .first()
                .map(|d| d.trim())
                .unwrap_or_default(),
            long_date(trip.start_date),
            budget.traveler_count
        ),
        SectionKind::Return => format!(
            "Describe how to get from {} back to {} on {}: transport options, typical travel \
             time, approximate fares for {} travelers and departure-day timing.",
            trip.destinations.last().map(|d| d.trim()).unwrap_or_default(),
            trip.return_city.trim(),
            long_date(trip.end_date),
            budget.traveler_count
        ),
        SectionKind::Accommodation => format!(
            "List 3 to 5 places to stay in each of: {}. The group has {} per night for \
             accommodation ({} per person). Give a name, neighbourhood and nightly price for each.",
            destinations,
            format_money(budget.total_breakdown.accommodation),
            format_money(budget.per_person_daily.accommodation)
        ),
        SectionKind::Cuisine => format!(
            "List must-try local dishes in {} and where to eat them. The group has {} per day \
             for food ({} per person).",
            destinations,
            format_money(budget.total_breakdown.food),
            format_money(budget.per_person_daily.food)
        ),
        SectionKind::Costs => {
            let mut lines = vec![
                "Present this cost breakdown. These figures are final; do not recompute or \
                 change them, only explain how to use each category well."
                    .to_string(),
            ];
            for (name, amount) in budget.total_breakdown.entries() {
                lines.push(format!(
                    "- {}: {} per day for the group, {} for the trip",
                    name,
                    format_money(amount),
                    format_money(amount * f64::from(budget.duration_days))
                ));
            }
            lines.push(format!(
                "End the section with exactly this line: **Total**: {}",
                format_money(budget.total_estimate)
            ));
            lines.join("\n")
        }
        SectionKind::Transportation => format!(
            "Explain local transportation in {}: passes, typical fares and tips. The group has \
             {} per day for transportation.",
            destinations,
            format_money(budget.total_breakdown.transportation)
        ),
        SectionKind::Customs => format!(
            "List important local customs and etiquette for visitors to {}.",
            destinations
        ),
        SectionKind::Safety => format!(
            "Give practical safety tips and emergency contact numbers for {}.",
            destinations
        ),
        SectionKind::Packing => format!(
            "Give a season-appropriate packing list for {} between {} and {}.",
            destinations,
            long_date(trip.start_date),
            long_date(trip.end_date)
        ),
        SectionKind::Itinerary => String::new(),
    }
}

fn itinerary_prompts(
    trip: &TripRequest,
    budget: &BudgetBreakdown,
    context: &str,
) -> Vec<SectionPrompt> {
    let days = trip.day_plan();
    let chunk_count = days.len().div_ceil(ITINERARY_DAYS_PER_PROMPT);
    let base_label = SectionKind::Itinerary.label();

    days.chunks(ITINERARY_DAYS_PER_PROMPT)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let first_day = chunk_idx * ITINERARY_DAYS_PER_PROMPT + 1;
            let last_day = first_day + chunk.len() - 1;

            let label = if chunk_count > 1 {
                format!("{} (Days {}-{})", base_label, first_day, last_day)
            } else {
                base_label.to_string()
            };

            let day_list = chunk
                .iter()
                .enumerate()
                .map(|(offset, (date, city))| {
                    format!("- Day {}: {} in {}", first_day + offset, long_date(*date), city)
                })
                .collect::<Vec<_>>()
                .join("\n");

            let prompt = format!(
                "{context}\n\n\
                 Write the day-by-day itinerary for exactly these {count} days. Every listed day \
                 must appear, in order, and no other days:\n{day_list}\n\n\
                 For each day start with a bold line like **Day N - date - city**, then bullets \
                 starting with Morning:, Afternoon: and Evening:, including meals, transport \
                 between places and opening hours. Finish each day with a bullet \
                 \"Daily total: $amount\".\n\
                 Each day's spend for the whole group must be at least {min} (80% of the daily \
                 budget) and at most {max} (100% of the daily budget).\n\n\
                 {rules}",
                context = context,
                count = chunk.len(),
                day_list = day_list,
                min = format_money(budget.min_daily_spend()),
                max = format_money(budget.daily_total_for_group),
                rules = FORMATTING_RULES,
            );

            SectionPrompt {
                kind: SectionKind::Itinerary,
                label,
                prompt,
            }
        })
        .collect()
}

/// Build the persona chat prompt for a free-text question.
pub fn build_chat_prompt(question: &str, transcript: &[ChatTurn]) -> String {
    let mut prompt = String::from(CHAT_PERSONA);

    let start = transcript.len().saturating_sub(CHAT_CONTEXT_TURNS);
    let recent = &transcript[start..];
    if !recent.is_empty() {
        prompt.push_str("\n\nConversation so far:\n");
        for turn in recent {
            prompt.push_str(&turn.describe());
            prompt.push('\n');
        }
    }

    prompt.push_str("\nTraveler: ");
    prompt.push_str(question.trim());
    prompt.push_str("\nAssistant:");
    prompt
}

fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let negative = cents < 0;
    let cents = cents.abs();
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::new();
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::budget::estimate;

    fn trip(days: i64) -> TripRequest {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        TripRequest {
            starting_location: "Berlin".to_string(),
            destinations: vec!["Rome".to_string(), "Florence".to_string()],
            return_city: "Munich".to_string(),
            start_date: start,
            end_date: start + chrono::Duration::days(days - 1),
            daily_budget_per_person: 500.0,
            traveler_count: 2,
            interests: vec!["Food & Cuisine".to_string()],
            travel_styles: vec!["Cultural".to_string()],
            language: "Spanish".to_string(),
        }
    }

    fn prompts_for(days: i64) -> Vec<SectionPrompt> {
        let trip = trip(days);
        let budget = estimate(trip.duration_days(), 500.0, 2).unwrap();
        build_prompts(&trip, &budget)
    }

    #[test]
    fn test_core_sections_in_order() {
        let prompts = prompts_for(3);
        let labels: Vec<&str> = prompts.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Overview",
                "Weather and Best Time to Visit",
                "Departure Logistics",
                "Day-by-Day Itinerary",
                "Return Logistics",
                "Accommodation Recommendations",
                "Must-Try Local Cuisine",
                "Cost Breakdown",
            ]
        );
    }

    #[test]
    fn test_itinerary_is_chunked_and_enumerates_every_day() {
        let prompts = prompts_for(10);
        let itinerary: Vec<&SectionPrompt> = prompts
            .iter()
            .filter(|p| p.kind == SectionKind::Itinerary)
            .collect();
        assert_eq!(itinerary.len(), 3);
        assert_eq!(itinerary[0].label, "Day-by-Day Itinerary (Days 1-4)");
        assert_eq!(itinerary[2].label, "Day-by-Day Itinerary (Days 9-10)");

        for day in 1..=10 {
            let marker = format!("- Day {}:", day);
            let hits = itinerary
                .iter()
                .filter(|p| p.prompt.contains(&marker))
                .count();
            assert_eq!(hits, 1, "day {} should appear exactly once", day);
        }
        assert!(itinerary[0].prompt.contains("Thursday, May 1, 2025 in Rome"));
        assert!(itinerary[2].prompt.contains("Saturday, May 10, 2025 in Florence"));
    }

    #[test]
    fn test_prompts_embed_precomputed_numbers() {
        let prompts = prompts_for(5);
        let itinerary = prompts
            .iter()
            .find(|p| p.kind == SectionKind::Itinerary)
            .unwrap();
        assert!(itinerary.prompt.contains("at least $800.00"));
        assert!(itinerary.prompt.contains("at most $1,000.00"));

        let costs = prompts.iter().find(|p| p.kind == SectionKind::Costs).unwrap();
        assert!(costs.prompt.contains("**Total**: $5,000.00"));
        assert!(costs.prompt.contains("Accommodation: $400.00 per day"));

        for prompt in &prompts {
            assert!(prompt.prompt.contains("Write the answer in Spanish."));
            assert!(prompt.prompt.contains("currency symbol"));
            assert!(prompt.prompt.contains("Berlin -> Rome -> Florence -> Munich"));
        }
    }

    #[test]
    fn test_extended_sections() {
        let trip = trip(2);
        let budget = estimate(2, 100.0, 1).unwrap();
        let prompts = build_section_prompts(&trip, &budget, &SectionKind::ALL);
        assert_eq!(prompts.len(), 12);
        assert_eq!(prompts.last().unwrap().kind, SectionKind::Costs);
        assert!(prompts.iter().any(|p| p.label == "Safety Tips"));
    }

    #[test]
    fn test_chat_prompt_includes_recent_turns() {
        let transcript = vec![
            ChatTurn::Traveler {
                content: "Is Rome hot in May?".to_string(),
            },
            ChatTurn::Assistant {
                content: "Warm, around 24C.".to_string(),
            },
        ];
        let prompt = build_chat_prompt("  What should I pack? ", &transcript);
        assert!(prompt.starts_with(CHAT_PERSONA));
        assert!(prompt.contains("Traveler: Is Rome hot in May?"));
        assert!(prompt.contains("Assistant: Warm, around 24C."));
        assert!(prompt.ends_with("Traveler: What should I pack?\nAssistant:"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_money(999.999), "$1,000.00");
    }
}

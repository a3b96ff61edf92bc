//! trip-planner-rs: a travel itinerary generator backed by a hosted LLM
//!
//! Trip parameters are turned into section-scoped prompts with pre-computed
//! budget figures, sent to an OpenAI-compatible text endpoint, and the
//! returned markdown-like text is rendered to plain text and PDF exports.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use trip_planner_rs::{render, AppState, Planner, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = Planner::from_env()?;
//!     let mut state = AppState::new();
//!
//!     let trip = TripRequest {
//!         starting_location: "Berlin".into(),
//!         destinations: vec!["Rome".into()],
//!         return_city: "Berlin".into(),
//!         start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
//!         end_date: NaiveDate::from_ymd_opt(2025, 5, 4).unwrap(),
//!         daily_budget_per_person: 150.0,
//!         traveler_count: 2,
//!         interests: vec!["Food & Cuisine".into()],
//!         travel_styles: vec![],
//!         language: "English".into(),
//!     };
//!
//!     let plan = planner.generate_plan(&mut state, &trip).await?;
//!     let pdf = render::pdf_export(&plan.plan_text, &plan.destination_summary)?;
//!     println!("{} ({} PDF bytes)", plan.summary(), pdf.len());
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod core;
pub mod error;
pub mod render;
pub(crate) mod services;
pub mod types;

pub use crate::core::{
    assemble_plan_text, build_chat_prompt, build_prompts, build_section_prompts,
    check_stated_total, estimate, format_money, AppState, ChatTurn, GenerationClient,
    GenerationConfig, Planner, SectionKind, SectionPrompt, TextGenerator,
};
pub use error::{Result, TravelError};
pub use render::{render, RenderedDocument};
pub use types::{
    parse_budget, BudgetBreakdown, BudgetCheck, CategoryAmounts, GeneratedPlan, GeneratedText,
    HistoryEntry, HistoryStats, SectionOutcome, TokenUsage, TripRequest,
};

#[cfg(feature = "cli")]
pub mod cli;

pub mod budget;
pub mod history;
pub mod result;
pub mod trip;

pub use budget::{BudgetBreakdown, BudgetCheck, CategoryAmounts};
pub use history::{HistoryEntry, HistoryStats};
pub use result::{GeneratedPlan, GeneratedText, SectionOutcome, TokenUsage};
pub use trip::{allocate_days, parse_budget, TripRequest, MAX_DESTINATIONS, MAX_TRIP_DAYS};

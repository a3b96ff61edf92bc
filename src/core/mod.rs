pub mod chat;
pub mod planner;
pub mod session;

pub use crate::services::budget::{check_stated_total, estimate, round_currency};
pub use crate::services::generation_client::{
    GenerationClient, GenerationConfig, TextGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use crate::services::planning::{
    build_chat_prompt, build_prompts, build_section_prompts, format_money, SectionKind,
    SectionPrompt, ITINERARY_DAYS_PER_PROMPT,
};
pub use chat::ChatTurn;
pub use planner::{assemble_plan_text, Planner, SECTION_ERROR_PLACEHOLDER};
pub use session::AppState;

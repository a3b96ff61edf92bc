use crate::{
    core::{chat::ChatTurn, session::AppState},
    error::{Result, TravelError},
    services::{
        budget::{check_stated_total, estimate},
        generation_client::{GenerationClient, GenerationConfig, TextGenerator},
        planning::{build_chat_prompt, build_section_prompts, SectionKind},
    },
    types::{
        history::HistoryEntry,
        result::{GeneratedPlan, GeneratedText, SectionOutcome, TokenUsage},
        trip::TripRequest,
    },
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::timeout;
use tracing::{info, warn};

/// Prefix of the inline placeholder substituted for a failed section
pub const SECTION_ERROR_PLACEHOLDER: &str = "Error generating this section";

/// Drives section-scoped prompts through a text generator and assembles the plan
#[derive(Debug, Clone)]
pub struct Planner {
    generator: Arc<dyn TextGenerator>,
    generation_config: GenerationConfig,
    timeout: Duration,
    sections: Vec<SectionKind>,
}

impl Planner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            generation_config: GenerationConfig::default(),
            timeout: Duration::from_secs(120),
            sections: SectionKind::CORE.to_vec(),
        }
    }

    /// Build a planner backed by [`GenerationClient::from_env`]
    pub fn from_env() -> Result<Self> {
        let client = GenerationClient::from_env()?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sections(mut self, sections: impl Into<Vec<SectionKind>>) -> Self {
        self.sections = sections.into();
        self
    }

    /// Also generate transportation, customs, safety and packing sections
    pub fn with_extended_sections(self) -> Self {
        self.with_sections(SectionKind::ALL)
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
    }

    /// Generate a full plan for `trip` and record it in the session history.
    ///
    /// Invalid input returns `InvalidParameter` before any call is made and
    /// leaves `state` untouched. Generation failures are contained per
    /// section: the section gets an inline placeholder and the rest of the
    /// plan is still produced.
    pub async fn generate_plan(
        &self,
        state: &mut AppState,
        trip: &TripRequest,
    ) -> Result<GeneratedPlan> {
        let start_time = Instant::now();

        trip.validate()?;
        let budget = estimate(
            trip.duration_days(),
            trip.daily_budget_per_person,
            trip.traveler_count,
        )?;

        let prompts = build_section_prompts(trip, &budget, &self.sections);
        let mut sections = Vec::with_capacity(prompts.len());
        let mut usage: Option<TokenUsage> = None;

        for section in prompts {
            info!(
                target: "trip_planner::sections",
                label = %section.label,
                "generating section"
            );

            match self.generate(&section.prompt).await {
                Ok(generated) => {
                    if let Some(reported) = &generated.usage {
                        usage.get_or_insert_with(TokenUsage::default).accumulate(reported);
                    }
                    sections.push(SectionOutcome {
                        label: section.label,
                        text: generated.text.trim().to_string(),
                        error: None,
                    });
                }
                Err(err) if err.is_generation_failure() => {
                    warn!(
                        target: "trip_planner::sections",
                        label = %section.label,
                        error = %err,
                        "section generation failed"
                    );
                    sections.push(SectionOutcome {
                        label: section.label,
                        text: format!("{}: {}", SECTION_ERROR_PLACEHOLDER, err.user_message()),
                        error: Some(err.to_string()),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let plan_text = assemble_plan_text(&sections);
        let budget_check = check_stated_total(&plan_text, &budget);
        if let Some(check) = budget_check.as_ref().filter(|c| !c.within_tolerance) {
            warn!(
                target: "trip_planner::sections",
                stated = check.stated,
                expected = check.expected,
                "stated total differs from the computed estimate"
            );
        }

        let destination_summary = trip.destination_summary();
        state.record_trip(HistoryEntry {
            destination: destination_summary.clone(),
            start_date: trip.start_date,
            duration_days: budget.duration_days,
            daily_budget_per_person: budget.daily_budget_per_person,
            traveler_count: budget.traveler_count,
            estimated_cost: budget.total_estimate,
        });

        Ok(GeneratedPlan {
            destination_summary,
            budget,
            sections,
            plan_text,
            usage,
            budget_check,
            duration: start_time.elapsed(),
        })
    }

    /// Ask the travel assistant a free-text question.
    ///
    /// Both turns are appended to the transcript only when the model answers.
    pub async fn ask(&self, state: &mut AppState, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(TravelError::InvalidParameter(
                "Question cannot be empty".to_string(),
            ));
        }

        let prompt = build_chat_prompt(question, state.transcript());
        let reply = self.generate(&prompt).await?;
        let answer = reply.text.trim().to_string();

        state.push_turn(ChatTurn::Traveler {
            content: question.trim().to_string(),
        });
        state.push_turn(ChatTurn::Assistant {
            content: answer.clone(),
        });

        Ok(answer)
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedText> {
        timeout(
            self.timeout,
            self.generator.generate_text(prompt, &self.generation_config),
        )
        .await
        .map_err(|_| TravelError::Timeout("Generation call timed out".to_string()))?
    }
}

/// Join section outcomes into one plan text with a `# label` header each.
pub fn assemble_plan_text(sections: &[SectionOutcome]) -> String {
    sections
        .iter()
        .map(|section| format!("# {}\n\n{}\n", section.label, section.text))
        .collect::<Vec<_>>()
        .join("\n")
}

use crate::types::budget::{BudgetBreakdown, BudgetCheck};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token usage information from the API
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Add another usage report to this one
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Text returned by the generation service for one prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl GeneratedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Outcome of one section-scoped prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionOutcome {
    /// Heading the section is rendered under
    pub label: String,
    /// Model output, or the inline placeholder when generation failed
    pub text: String,
    /// Set when the placeholder was substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionOutcome {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a full plan generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    /// Destinations as shown in headers and file names
    pub destination_summary: String,
    /// Deterministic budget the prompts were built from
    pub budget: BudgetBreakdown,
    /// Section outcomes in prompt order
    pub sections: Vec<SectionOutcome>,
    /// Assembled markdown-like plan text, one `# label` header per section
    pub plan_text: String,
    /// Accumulated token usage (if reported by the API)
    pub usage: Option<TokenUsage>,
    /// Comparison of the model's stated total against the estimate
    pub budget_check: Option<BudgetCheck>,
    /// Wall-clock generation time
    pub duration: Duration,
}

impl GeneratedPlan {
    /// Sections that fell back to the error placeholder
    pub fn failed_sections(&self) -> Vec<&SectionOutcome> {
        self.sections.iter().filter(|s| s.is_failed()).collect()
    }

    /// Human-readable summary of the generation run
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("=== Travel Plan: {} ===", self.destination_summary));
        lines.push(format!("Duration: {:.2}s", self.duration.as_secs_f64()));
        lines.push(format!(
            "Sections: {} generated, {} failed",
            self.sections.len() - self.failed_sections().len(),
            self.failed_sections().len()
        ));

        if let Some(tokens) = &self.usage {
            lines.push(format!(
                "Tokens: {} prompt + {} completion = {} total",
                tokens.prompt_tokens, tokens.completion_tokens, tokens.total_tokens
            ));
        }

        lines.push(format!(
            "Estimated total: ${:.2} ({} days, {} travelers)",
            self.budget.total_estimate, self.budget.duration_days, self.budget.traveler_count
        ));

        match &self.budget_check {
            Some(check) if check.within_tolerance => lines.push(format!(
                "Stated total ${:.2} matches the estimate",
                check.stated
            )),
            Some(check) => lines.push(format!(
                "Stated total ${:.2} differs from the estimate by {:.0}%",
                check.stated,
                check.deviation() * 100.0
            )),
            None => lines.push("No stated total found in the cost section".to_string()),
        }

        for section in self.failed_sections() {
            lines.push(format!(
                "! {}: {}",
                section.label,
                section.error.as_deref().unwrap_or_default()
            ));
        }

        lines.join("\n")
    }
}

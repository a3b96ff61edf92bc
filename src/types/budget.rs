use serde::{Deserialize, Serialize};

/// Amounts for the four spending categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryAmounts {
    pub accommodation: f64,
    pub food: f64,
    pub activities: f64,
    pub transportation: f64,
}

impl CategoryAmounts {
    /// Sum of all four categories
    pub fn total(&self) -> f64 {
        self.accommodation + self.food + self.activities + self.transportation
    }

    /// Category name and amount pairs in display order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("Accommodation", self.accommodation),
            ("Food", self.food),
            ("Activities", self.activities),
            ("Transportation", self.transportation),
        ]
    }
}

/// Deterministic cost breakdown derived from the trip parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetBreakdown {
    /// Trip length in days
    pub duration_days: u32,
    /// Travelers sharing the trip
    pub traveler_count: u32,
    /// Daily budget of a single traveler
    pub daily_budget_per_person: f64,
    /// Daily spend for the whole group
    pub daily_total_for_group: f64,
    /// Spend for the whole group over the whole trip
    pub total_estimate: f64,
    /// Per-traveler daily amounts by category
    pub per_person_daily: CategoryAmounts,
    /// Group daily amounts by category
    pub total_breakdown: CategoryAmounts,
}

impl BudgetBreakdown {
    /// Sum of the per-person categories; equals the daily budget within rounding
    pub fn category_total(&self) -> f64 {
        self.per_person_daily.total()
    }

    /// Lowest acceptable daily group spend under the 80% rule
    pub fn min_daily_spend(&self) -> f64 {
        self.daily_total_for_group * 0.8
    }
}

/// Comparison between the model's stated trip total and the computed estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetCheck {
    /// Total the model wrote in its cost section
    pub stated: f64,
    /// Total computed by the estimator
    pub expected: f64,
    /// Whether `stated` is within the accepted tolerance of `expected`
    pub within_tolerance: bool,
}

impl BudgetCheck {
    /// Signed relative deviation of the stated total
    pub fn deviation(&self) -> f64 {
        if self.expected == 0.0 {
            return if self.stated == 0.0 { 0.0 } else { 1.0 };
        }
        (self.stated - self.expected) / self.expected
    }
}

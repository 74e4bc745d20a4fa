//! Result types produced by CLI commands.

use acuity_filter::Domain;

/// One executed query, ready for printing.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub domain: Domain,
    pub datasets: String,
    /// Events loaded before any filtering.
    pub total: usize,
    pub population_filtered: usize,
    pub filtered: usize,
    /// Subjects that passed the population filter.
    pub subjects: usize,
    pub columns: Vec<&'static str>,
    /// Rendered rows, capped at the requested limit.
    pub rows: Vec<Vec<String>>,
    /// Filters still available, in their wire form.
    pub available: serde_json::Value,
}

impl QueryOutcome {
    pub fn truncated(&self) -> bool {
        self.rows.len() < self.filtered
    }
}

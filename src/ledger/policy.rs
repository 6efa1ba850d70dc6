use serde::{Deserialize, Serialize};

/// Absorbs floating-point drift in currency arithmetic.
pub const TOLERANCE: f64 = 0.001;

/// Days after the issue date an invoice without a due date counts as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReconPolicy {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_overdue_after_days")]
    pub overdue_after_days: i64,
    #[serde(default = "default_cash_methods")]
    pub cash_methods: Vec<String>,
}

fn default_tolerance() -> f64 {
    TOLERANCE
}

fn default_overdue_after_days() -> i64 {
    OVERDUE_AFTER_DAYS
}

fn default_cash_methods() -> Vec<String> {
    vec!["cash".to_string(), "efectivo".to_string()]
}

impl Default for ReconPolicy {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            overdue_after_days: default_overdue_after_days(),
            cash_methods: default_cash_methods(),
        }
    }
}
